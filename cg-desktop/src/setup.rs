use std::fs::{self, OpenOptions};
use std::io::Write;

use cg_core::config::SystemConfig;
use env_logger::{Builder, Target};

use crate::config_gen;

pub const CONFIG_PATH: &str = "config.toml";

/// With `json_output` the log goes to stderr so stdout carries only
/// snapshot lines.
pub fn init(json_output: bool) {
    config_gen::ensure_config_exists(CONFIG_PATH);

    if let Err(e) = cg_shared::config::init(CONFIG_PATH) {
        eprintln!("Config load warning: {}", e);
    }

    init_logger(json_output);
}

struct TeeWriter<W1, W2>(W1, W2);

impl<W1: Write, W2: Write> Write for TeeWriter<W1, W2> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.0.write(buf)?;
        self.1.write_all(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()?;
        self.1.flush()
    }
}

fn init_logger(json_output: bool) {
    let sys_cfg: SystemConfig = cg_shared::config::get("system");
    if let Err(e) = fs::create_dir_all(&sys_cfg.log_path) {
        eprintln!("Failed to create log dir: {}", e);
    }

    let log_file_path = std::path::Path::new(&sys_cfg.log_path).join("cg-player.log");
    let mut builder = Builder::from_env(env_logger::Env::default().default_filter_or(&sys_cfg.log_level));

    // 日志文件打不开时只输出到终端
    match OpenOptions::new().create(true).append(true).open(&log_file_path) {
        Ok(log_file) if json_output => {
            builder.target(Target::Pipe(Box::new(TeeWriter(std::io::stderr(), log_file))));
        }
        Ok(log_file) => {
            builder.target(Target::Pipe(Box::new(TeeWriter(std::io::stdout(), log_file))));
        }
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_file_path, e);
            builder.target(if json_output { Target::Stderr } else { Target::Stdout });
        }
    }

    builder.init();
}
