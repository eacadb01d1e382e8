use std::process::ExitCode;

fn main() -> ExitCode {
    match lfs_audit_cli::main_entry() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(lfs_audit_cli::EXIT_INTERNAL)
        }
    }
}
