fn main() {
    if let Err(err) = frame_store::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
