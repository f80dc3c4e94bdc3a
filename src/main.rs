fn main() {
    if let Err(err) = palaver::cli::main() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
