use ort::execution_providers::ExecutionProviderDispatch;

/// Set to any non-empty value other than `0` to keep inference on the CPU.
pub const CPU_ONLY_ENV: &str = "EMOTION_STREAM_CPU_ONLY";

/// Execution providers for every ONNX session the stream opens.
///
/// ONNX Runtime falls back to CPU when the platform provider cannot be
/// registered, so an empty list simply means CPU.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    if cpu_only(std::env::var(CPU_ONLY_ENV).ok().as_deref()) {
        log::debug!("{CPU_ONLY_ENV} set; using the CPU execution provider");
        return Vec::new();
    }
    log::debug!("Preferred execution provider: {}", platform_provider_name());
    platform_providers()
}

/// Human-readable name of the accelerated provider for this platform.
pub fn platform_provider_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "CoreML"
    } else if cfg!(target_os = "windows") {
        "DirectML"
    } else {
        "CPU"
    }
}

fn cpu_only(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if !v.is_empty() && v != "0")
}

#[cfg(target_os = "macos")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
}

#[cfg(target_os = "windows")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, false)]
    #[case(Some(""), false)]
    #[case(Some("0"), false)]
    #[case(Some(" 0 "), false)]
    #[case(Some("1"), true)]
    #[case(Some("yes"), true)]
    fn test_cpu_only_flag(#[case] value: Option<&str>, #[case] expected: bool) {
        assert_eq!(cpu_only(value), expected);
    }

    #[test]
    fn test_provider_name_matches_platform() {
        let name = platform_provider_name();
        if cfg!(any(target_os = "macos", target_os = "windows")) {
            assert_ne!(name, "CPU");
        } else {
            assert_eq!(name, "CPU");
            assert!(platform_providers().is_empty());
        }
    }
}
