fn main() -> std::process::ExitCode {
    nullstrap_lib::run()
}
