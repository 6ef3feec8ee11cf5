pub mod mdjs;
pub mod resolve;
pub mod version;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// Exit code for bad input: missing files, broken config.
pub const EXIT_VALIDATION_ERROR: i32 = 2;

/// Exit code for failures inside resolution or compilation.
pub const EXIT_INTERNAL_ERROR: i32 = 1;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

/// Report a failure and exit.
///
/// In JSON mode the error is a `{ "ok": false, "error": { code, message } }`
/// object on stdout; otherwise a single line on stderr.
pub fn fail(json: bool, code: &str, message: &str, exit_code: i32) -> ! {
    if json {
        let error_json = serde_json::json!({
            "ok": false,
            "error": {
                "code": code,
                "message": message,
            }
        });
        match serde_json::to_string_pretty(&error_json) {
            Ok(s) => println!("{s}"),
            Err(_) => println!("{error_json}"),
        }
    } else {
        eprintln!("error: {message}");
    }
    std::process::exit(exit_code);
}
