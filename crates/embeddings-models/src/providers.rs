//! Execution provider name normalization.
//!
//! Configuration uses short symbolic names ("cpu", "cuda", "mps"); runtimes
//! expect their own identifiers. Unknown names pass through unchanged.

pub const CPU_PROVIDER: &str = "CPUExecutionProvider";
pub const CUDA_PROVIDER: &str = "CUDAExecutionProvider";
pub const COREML_PROVIDER: &str = "CoreMLExecutionProvider";
pub const DIRECTML_PROVIDER: &str = "DmlExecutionProvider";
pub const TENSORRT_PROVIDER: &str = "TensorrtExecutionProvider";

/// Map one symbolic provider name to its runtime identifier.
pub fn normalize_provider(name: &str) -> String {
    let trimmed = name.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "cpu" => CPU_PROVIDER.to_string(),
        "cuda" | "gpu" => CUDA_PROVIDER.to_string(),
        "mps" | "metal" | "coreml" => COREML_PROVIDER.to_string(),
        "dml" | "directml" => DIRECTML_PROVIDER.to_string(),
        "tensorrt" | "trt" => TENSORRT_PROVIDER.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Normalize a preference list, keeping order and dropping blanks and duplicates.
pub fn normalize_providers(names: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names.iter().filter(|n| !n.trim().is_empty()) {
        let provider = normalize_provider(name);
        if !normalized.contains(&provider) {
            normalized.push(provider);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_names() {
        assert_eq!(normalize_provider("cpu"), CPU_PROVIDER);
        assert_eq!(normalize_provider("CUDA"), CUDA_PROVIDER);
        assert_eq!(normalize_provider(" mps "), COREML_PROVIDER);
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(normalize_provider("ROCMExecutionProvider"), "ROCMExecutionProvider");
        assert_eq!(normalize_provider(CPU_PROVIDER), CPU_PROVIDER);
    }

    #[test]
    fn test_list_keeps_order_and_dedups() {
        let names = vec![
            "cuda".to_string(),
            "".to_string(),
            "cpu".to_string(),
            "CPU".to_string(),
        ];
        assert_eq!(normalize_providers(&names), vec![CUDA_PROVIDER, CPU_PROVIDER]);
    }
}
