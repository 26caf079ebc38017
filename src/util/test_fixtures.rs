use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;

/// Writes `chunks` as separate gzip members, the way bgzip does
pub fn write_multi_member_gz(path: &Path, chunks: &[&str]) {
    let mut out = Vec::new();
    for chunk in chunks {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(chunk.as_bytes()).unwrap();
        out.extend(enc.finish().unwrap());
    }
    std::fs::write(path, out).unwrap();
}
