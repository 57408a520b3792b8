fn main() {
    if let Err(e) = airhid_lib::run() {
        log::error!("{e}");
        eprintln!("启动失败: {e}");
        std::process::exit(1);
    }
}
