use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "MKT_HOST",
        "MKT_PORT",
        "MKT_DATABASE_URL",
        "MKT_AUTO_MIGRATE",
        "MKT_JWT_EXPIRY_HOURS",
        "MKT_UNPAID_ORDER_TIMEOUT",
        "MKT_EXPIRY_CHECK_INTERVAL",
        "MKT_USE_X_FORWARDED_FOR",
        "MKT_USE_FORWARDED",
        "MKT_ADMIN_USERNAME",
        "MKT_ADMIN_EMAIL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
