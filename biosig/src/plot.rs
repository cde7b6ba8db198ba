use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use itertools::Itertools;
use tracing::info;

use crate::signal::Signal;
use crate::spectrum::SpectrumResult;

/// Errors raised by plot utilities.
#[derive(Debug)]
pub enum PlotError {
    /// Underlying process or filesystem I/O failure.
    Io(std::io::Error),
    /// Python subprocess stdin was unavailable.
    StdinUnavailable,
    /// Python subprocess exited unsuccessfully.
    PythonExitFailure(ExitStatus),
}

impl core::fmt::Display for PlotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlotError::Io(err) => write!(f, "plot I/O failure: {err}"),
            PlotError::StdinUnavailable => {
                write!(f, "failed to open stdin for python plotting process")
            }
            PlotError::PythonExitFailure(status) => {
                write!(f, "python plotting script failed with status: {status}")
            }
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Io(err) => Some(err),
            PlotError::StdinUnavailable | PlotError::PythonExitFailure(_) => None,
        }
    }
}

impl From<std::io::Error> for PlotError {
    fn from(value: std::io::Error) -> Self {
        PlotError::Io(value)
    }
}

fn py_float(x: f64) -> String {
    if x.is_nan() {
        "float('nan')".to_string()
    } else if x.is_infinite() {
        if x > 0.0 {
            "float('inf')".to_string()
        } else {
            "float('-inf')".to_string()
        }
    } else {
        format!("{x:?}")
    }
}

fn py_list(xs: impl IntoIterator<Item = f64>) -> String {
    format!("[{}]", xs.into_iter().map(py_float).join(", "))
}

/// Double-quoted Python string literal.
fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Matplotlib script drawing `signal` over time and `spectrum` over
/// frequency, with the dominant peaks marked, saved as a PNG at `output_path`.
pub fn render_analysis_script(
    signal: &Signal,
    spectrum: &SpectrumResult,
    output_path: &Path,
) -> String {
    format!(
        r#"
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt

t = {t}
x = {x}
f = {f}
p = {p}
peak_f = {peak_f}
peak_p = {peak_p}

fig, (ax_t, ax_f) = plt.subplots(2, 1, figsize=(12, 8))
ax_t.plot(t, x, linewidth=0.8)
ax_t.set_xlabel("Time (s)")
ax_t.set_ylabel("Amplitude")
ax_t.set_title("Signal ({fs} Hz)")
ax_f.semilogy(f, p, linewidth=0.8)
ax_f.plot(peak_f, peak_p, "rx", label="dominant")
for pf, pp in zip(peak_f, peak_p):
    ax_f.annotate(f"{{pf:.2f}} Hz", (pf, pp))
ax_f.set_xlabel("Frequency (Hz)")
ax_f.set_ylabel("Power")
ax_f.legend()
fig.tight_layout()
fig.savefig({out}, dpi=150)
plt.close(fig)
"#,
        t = py_list(signal.time_axis()),
        x = py_list(signal.samples().iter().copied()),
        f = py_list(spectrum.frequencies.iter().copied()),
        // log axes cannot draw zero
        p = py_list(spectrum.power_spectrum.iter().map(|v| v.max(f64::MIN_POSITIVE))),
        peak_f = py_list(spectrum.dominant_frequencies.iter().map(|d| d.frequency)),
        peak_p = py_list(spectrum.dominant_frequencies.iter().map(|d| d.power)),
        fs = signal.sampling_rate(),
        out = py_str(&output_path.to_string_lossy()),
    )
}

/// Render the analysis with the system `python` and a non-interactive
/// backend. Returns the PNG path when plotting succeeds.
pub fn plot_analysis_to_path<P: AsRef<Path>>(
    signal: &Signal,
    spectrum: &SpectrumResult,
    output_path: P,
) -> Result<PathBuf, PlotError> {
    let output_path = output_path.as_ref().to_path_buf();
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let script = render_analysis_script(signal, spectrum, &output_path);

    let mut python = std::process::Command::new("python")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::null()) // noisy
        .stderr(std::process::Stdio::null()) // noisy
        .spawn()?;

    // stdin is dropped before waiting so python sees EOF
    let written = match python.stdin.take() {
        Some(mut stdin) => stdin.write_all(script.as_bytes()).map_err(PlotError::from),
        None => Err(PlotError::StdinUnavailable),
    };
    let status = python.wait();
    written?;
    let status = status?;
    if !status.success() {
        return Err(PlotError::PythonExitFailure(status));
    }
    info!(path = %output_path.display(), "rendered analysis plot");
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::SpectrumEngine;

    #[test]
    fn script_embeds_series_and_peaks() {
        let x = (0..40)
            .map(|i| (2.0 * core::f64::consts::PI * 5.0 * i as f64 / 40.0).sin())
            .collect();
        let signal = Signal::new(x, 40.0).expect("signal");
        let spectrum = SpectrumEngine::default()
            .analyze_spectrum(&signal, None)
            .expect("spectrum");
        let script = render_analysis_script(&signal, &spectrum, Path::new("out/plot.png"));
        assert!(script.contains("matplotlib.use(\"Agg\")"));
        assert!(script.contains("peak_f = [5.0]"));
        assert!(script.contains("fig.savefig(\"out/plot.png\", dpi=150)"));
        assert!(script.contains("Signal (40 Hz)"));
    }

    #[test]
    fn non_finite_values_are_python_floats() {
        assert_eq!(
            py_list([1.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY]),
            "[1.5, float('nan'), float('inf'), float('-inf')]"
        );
        let signal = Signal::new(vec![0.0, f64::NAN, 1.0, 0.0], 4.0).expect("signal");
        let spectrum = SpectrumEngine::default()
            .analyze_spectrum(&signal.with_samples(vec![0.0, 1.0, 0.0, -1.0]), None)
            .expect("spectrum");
        let script = render_analysis_script(&signal, &spectrum, Path::new("p.png"));
        assert!(script.contains("x = [0.0, float('nan'), 1.0, 0.0]"));
        assert!(!script.contains("NaN"));
    }

    #[test]
    fn output_path_is_an_escaped_literal() {
        assert_eq!(py_str(r"C:\plots\a.png"), r#""C:\\plots\\a.png""#);
        assert_eq!(py_str("say \"hi\".png"), r#""say \"hi\".png""#);
        let signal = Signal::new(vec![0.0, 1.0, 0.0, -1.0], 4.0).expect("signal");
        let spectrum = SpectrumEngine::default()
            .analyze_spectrum(&signal, None)
            .expect("spectrum");
        let script = render_analysis_script(&signal, &spectrum, Path::new("dir\\q\"x.png"));
        assert!(script.contains(r#"fig.savefig("dir\\q\"x.png", dpi=150)"#));
    }
}
