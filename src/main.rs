fn main() {
    if let Err(err) = team_topology_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
