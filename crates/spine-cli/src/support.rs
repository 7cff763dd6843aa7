use serde_json::Value;
use spine_ana::{Analysis, AnalysisError};
use spine_config::{AnalysisConfig, ConfigError};
use spine_kernel::Catalog;

pub fn exit_with(error: &AnalysisError) -> ! {
    eprintln!("error: {error}");
    std::process::exit(error.exit_code());
}

pub fn load_config_or_exit(path: &str) -> AnalysisConfig {
    spine_config::load(path).unwrap_or_else(|e| {
        let code = if matches!(e, ConfigError::ReadFile { .. }) { 2 } else { 1 };
        eprintln!("error: {e}");
        std::process::exit(code);
    })
}

pub fn bootstrap_or_exit() -> Catalog {
    spine_content::bootstrap().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

/// Loads, bootstraps, publishes categories, and compiles every branch.
pub fn compile_or_exit(path: &str) -> Analysis {
    let config = load_config_or_exit(path);
    let catalog = bootstrap_or_exit();
    Analysis::new(config, catalog).unwrap_or_else(|e| exit_with(&e))
}

pub fn print_json(payload: &Value) {
    match serde_json::to_string_pretty(payload) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => {
            eprintln!("error: failed to render JSON: {e}");
            std::process::exit(2);
        }
    }
}
