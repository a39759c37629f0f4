fn main() {
    britescript::cli::run();
}
