//! cmis - command-line inspector for CMIS repositories

fn main() {
    if let Err(err) = cmisclient::cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
