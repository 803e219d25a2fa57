use audit_cli::doctor;
use std::process;

fn main() {
    let fast_mode = std::env::var("PYAUDIT_DOCTOR_FAST").is_ok_and(|value| value == "1");

    let mut stdout = std::io::stdout();
    let code = match doctor::run(&mut stdout, fast_mode, doctor::probe_tool) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    };

    process::exit(code);
}
