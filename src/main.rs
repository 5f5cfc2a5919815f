fn main() {
    grovegrid::cli::run();
}
