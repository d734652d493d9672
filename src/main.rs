fn main() {
    if let Err(err) = schema_graph::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
