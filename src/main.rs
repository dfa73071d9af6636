use colored::Colorize;

fn main() {
    if let Err(err) = treelint::cli::run() {
        eprintln!("{} {err:#}", "treelint error:".red());
        std::process::exit(1);
    }
}
