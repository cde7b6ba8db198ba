use biosig_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FilterSpec, NoiseReduction, NormalizeMethod, SignalConditioner};
use crate::signal::Signal;

/// One stage of a conditioning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ConditioningStep {
    /// [`SignalConditioner::remove_dc_offset`].
    RemoveDcOffset,
    /// [`SignalConditioner::normalize`].
    Normalize {
        /// Scheme.
        method: NormalizeMethod,
        /// Target range for [`NormalizeMethod::MinMax`].
        range: (f64, f64),
    },
    /// [`FilterSpec::apply`].
    Filter(FilterSpec),
    /// [`SignalConditioner::reduce_noise`].
    ReduceNoise(NoiseReduction),
}

impl ConditioningStep {
    /// Stable tag reported in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ConditioningStep::RemoveDcOffset => "remove_dc_offset",
            ConditioningStep::Normalize { .. } => "normalize",
            ConditioningStep::Filter(spec) => spec.name(),
            ConditioningStep::ReduceNoise(_) => "reduce_noise",
        }
    }
}

impl SignalConditioner {
    fn run_step(&self, signal: &Signal, step: &ConditioningStep) -> Result<Signal> {
        match step {
            ConditioningStep::RemoveDcOffset => Ok(self.remove_dc_offset(signal)),
            ConditioningStep::Normalize { method, range } => {
                Ok(self.normalize(signal, *method, range.0, range.1))
            }
            ConditioningStep::Filter(spec) => spec.apply(signal),
            ConditioningStep::ReduceNoise(method) => self.reduce_noise(signal, *method),
        }
    }

    /// Run `steps` in order, each on the previous step's output.
    ///
    /// The first failing step aborts the run and its error comes back as
    /// [`biosig_core::Error::PipelineStep`] carrying the zero-based step
    /// index and [`ConditioningStep::name`]. No partial signal is returned.
    pub fn preprocess_pipeline(&self, signal: &Signal, steps: &[ConditioningStep]) -> Result<Signal> {
        let mut current = signal.clone();
        for (index, step) in steps.iter().enumerate() {
            debug!(
                "step {}/{}: {}",
                index + 1,
                steps.len(),
                step.name()
            );
            current = self
                .run_step(&current, step)
                .map_err(|e| e.at_step(index, step.name()))?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use biosig_core::Error;

    fn ramp() -> Signal {
        Signal::new((0..64).map(|i| i as f64 + 100.0).collect(), 50.0).expect("signal")
    }

    #[test]
    fn steps_run_in_order() {
        let c = SignalConditioner::default();
        let out = c
            .preprocess_pipeline(
                &ramp(),
                &[
                    ConditioningStep::RemoveDcOffset,
                    ConditioningStep::Normalize {
                        method: NormalizeMethod::Unit,
                        range: (0.0, 1.0),
                    },
                ],
            )
            .expect("pipeline");
        assert_abs_diff_eq!(out.samples()[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.samples()[63], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn failing_step_reports_position() {
        let c = SignalConditioner::default();
        let steps = [
            ConditioningStep::RemoveDcOffset,
            ConditioningStep::ReduceNoise(NoiseReduction::Median { kernel_size: Some(3) }),
            ConditioningStep::Filter(FilterSpec::Bandpass {
                lowcut: 40.0,
                highcut: 30.0,
                order: 4,
            }),
        ];
        let err = c.preprocess_pipeline(&ramp(), &steps).expect_err("bad band");
        match err {
            Error::PipelineStep {
                index,
                step,
                source,
            } => {
                assert_eq!(index, 2);
                assert_eq!(step, "bandpass");
                assert!(matches!(*source, Error::InvalidParameter { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let c = SignalConditioner::default();
        assert_eq!(c.preprocess_pipeline(&ramp(), &[]).expect("identity"), ramp());
    }

    #[test]
    fn steps_deserialize_from_json() {
        let steps: Vec<ConditioningStep> = serde_json::from_str(
            r#"[
                { "step": "remove_dc_offset" },
                { "step": "reduce_noise", "method": "lowpass", "cutoff": 10.0 }
            ]"#,
        )
        .expect("steps");
        assert_eq!(steps[0], ConditioningStep::RemoveDcOffset);
        assert_eq!(
            steps[1],
            ConditioningStep::ReduceNoise(NoiseReduction::Lowpass { cutoff: Some(10.0) })
        );
        assert_eq!(steps[1].name(), "reduce_noise");
    }
}
