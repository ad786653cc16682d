/// 跟踪结果读取器 (JSON Lines)
/// 每行一个 TrackFrame, 由外部检测/跟踪器写出
use std::io::BufRead;

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::detection::TrackFrame;
use crate::error::FrameError;

/// 读取统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    pub frames_sent: u64,
    pub malformed_lines: u64,
    pub out_of_order: u64,
}

/// 按行解析 TrackFrame
pub struct FrameReader<R> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<TrackFrame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            self.line_no += 1;
            // 按字节读取: 非 UTF-8 的行作为解析错误处理, 不中断读取
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    if self.buf.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    return Some(serde_json::from_slice(&self.buf).map_err(|source| {
                        FrameError::Parse {
                            line: self.line_no,
                            source,
                        }
                    }));
                }
                Err(e) => return Some(Err(FrameError::Io(e))),
            }
        }
    }
}

/// 读取线程主体: 解析 → 顺序检查 → 发送到帧泵
///
/// 损坏的行和乱序帧被丢弃; IO 错误或帧泵退出时结束。
pub fn pump_frames<R: BufRead>(reader: R, tx: Sender<TrackFrame>) -> Result<ReaderStats, FrameError> {
    info!("🎬 跟踪数据读取启动");

    let mut stats = ReaderStats::default();
    let mut last_frame_id: Option<u64> = None;

    for item in FrameReader::new(reader) {
        let frame = match item {
            Ok(frame) => frame,
            Err(FrameError::Parse { line, source }) => {
                warn!("⚠️  第 {} 行不是合法的帧数据, 已跳过: {}", line, source);
                stats.malformed_lines += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        // 乱序帧会破坏区域穿越的先后判定
        if let Some(last) = last_frame_id {
            if frame.frame_id <= last {
                warn!("⚠️  帧 {} 乱序 (上一帧 {}), 已丢弃", frame.frame_id, last);
                stats.out_of_order += 1;
                continue;
            }
        }
        last_frame_id = Some(frame.frame_id);

        if tx.send(frame).is_err() {
            info!("帧泵已退出, 停止读取");
            break;
        }
        stats.frames_sent += 1;
    }

    info!(
        "✅ 跟踪数据读取结束: 发送 {} 帧, 损坏 {} 行, 乱序 {} 帧",
        stats.frames_sent, stats.malformed_lines, stats.out_of_order
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INPUT: &str = r#"{"frame_id":1,"entities":[{"id":7,"class":"person","bbox":{"x1":1,"y1":2,"x2":3,"y2":4},"confidence":0.8}]}

{"frame_id":2}
garbage
{"frame_id":2,"entities":[]}
{"frame_id":5,"entities":[]}
"#;

    #[test]
    fn test_reader_reports_parse_errors() {
        let items: Vec<_> = FrameReader::new(Cursor::new(INPUT)).collect();
        assert_eq!(items.len(), 5);
        assert!(items[0].is_ok());
        assert!(matches!(items[2], Err(FrameError::Parse { line: 4, .. })));
    }

    #[test]
    fn test_pump_frames_skips_invalid_utf8_line() {
        let mut input = b"{\"frame_id\":1}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"frame_id\":2}\n");

        let (tx, rx) = crossbeam_channel::unbounded();
        let stats = pump_frames(Cursor::new(input), tx).unwrap();

        let ids: Vec<u64> = rx.iter().map(|f| f.frame_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.frames_sent, 2);
    }

    #[test]
    fn test_pump_frames_drops_bad_and_out_of_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let stats = pump_frames(Cursor::new(INPUT), tx).unwrap();

        let ids: Vec<u64> = rx.iter().map(|f| f.frame_id).collect();
        assert_eq!(ids, vec![1, 2, 5]);
        assert_eq!(stats.frames_sent, 3);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.out_of_order, 1);
    }
}
