use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}

/// Reject a sampling rate that is not finite and strictly positive.
pub(crate) fn check_sampling_rate(arg: &'static str, fs: f64) -> Result<(), ConfigError> {
    if !fs.is_finite() || fs <= 0.0 {
        return Err(ConfigError::InvalidArgument {
            arg,
            reason: "sampling rate must be finite and > 0",
        });
    }
    Ok(())
}
