/// 聚合记录报表
///
/// 显示最近的跌倒统计记录及合计, 可导出完整报表
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use guardian_rs::config::GuardianConfig;
use guardian_rs::gen_time_string;
use guardian_rs::sinks::{JsonlRecordStore, RecordStore};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "跌倒统计记录报表", long_about = None)]
struct Args {
    /// 配置文件路径 (用于定位记录文件)
    #[arg(short, long, default_value = "guardian.json")]
    config: PathBuf,

    /// 直接指定记录文件, 优先于配置
    #[arg(long)]
    store: Option<PathBuf>,

    /// 显示条数
    #[arg(short, long, default_value_t = 10)]
    limit: usize,

    /// 导出完整报表 (JSON) 到该目录
    #[arg(long)]
    export: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level_filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(log_level_filter)
        .with_target(false)
        .init();

    let store_path = match args.store {
        Some(path) => path,
        None if args.config.exists() => {
            GuardianConfig::load(&args.config)
                .with_context(|| format!("加载配置失败: {}", args.config.display()))?
                .store_path
        }
        None => GuardianConfig::default().store_path,
    };

    let store = JsonlRecordStore::new(store_path);
    let recent = store
        .recent(args.limit)
        .with_context(|| format!("读取记录失败: {}", store.path().display()))?;

    println!("{:<20} {:>8} {:>8}", "时间", "跌倒", "正常");
    for record in &recent {
        println!(
            "{:<20} {:>8} {:>8}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.fall_count,
            record.normal_count
        );
    }

    let all = store.load_all()?;
    let total_fall: u64 = all.iter().map(|r| r.fall_count).sum();
    let total_normal: u64 = all.iter().map(|r| r.normal_count).sum();
    println!(
        "\n共 {} 条记录, 跌倒合计 {}, 正常合计 {}",
        all.len(),
        total_fall,
        total_normal
    );

    if let Some(dir) = args.export {
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("fall_report_{}.json", gen_time_string("")));
        let json = serde_json::to_string_pretty(&all)?;
        fs::write(&path, json).with_context(|| format!("导出失败: {}", path.display()))?;
        info!("📄 报表已导出: {}", path.display());
    }

    Ok(())
}
