fn main() {
    if let Err(err) = fleet_intake::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
