use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    const DISPLAY_ENVS: [&str; 20] = [
        "RUST_LOG",
        "DSF_HOST",
        "DSF_PORT",
        "DSF_DATABASE_URL",
        "DSF_PUBLIC_URL",
        "DSF_STRICT_MODE",
        "DSF_CURRENCY",
        "DSF_STRIPE_API_URL",
        "DSF_STRIPE_SIGNATURE_CHECKS",
        "DSF_STRIPE_WEBHOOK_TOLERANCE",
        "DSF_PAYPAL_API_URL",
        "DSF_PAYPAL_CLIENT_ID",
        "DSF_PAYPAL_WEBHOOK_ID",
        "DSF_PAYPAL_SIGNATURE_CHECKS",
        "DSF_MAIL_API_URL",
        "DSF_MAIL_FROM",
        "DSF_PDF_COMMAND",
        "DSF_PDF_ARGS",
        "DSF_PDF_TIMEOUT",
        "DSF_DEALERSHIP_NAME",
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
