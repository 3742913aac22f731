fn main() {
    let mut options = apod_tui::RunOptions::default();
    if handle_cli_flags(&mut options) {
        return;
    }

    if let Err(err) = apod_tui::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags(options: &mut apod_tui::RunOptions) -> bool {
    let mut saw_exit_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("APOD-TUI {}", apod_tui::VERSION);
                saw_exit_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "APOD-TUI: Browse astronomy pictures and videos from the terminal.\n\n  --demo               Use the built-in sample gallery instead of the network\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                saw_exit_flag = true;
            }
            "--demo" => options.demo = true,
            other => {
                eprintln!("Unknown argument: {other} (see --help)");
                std::process::exit(2);
            }
        }
    }
    saw_exit_flag
}
