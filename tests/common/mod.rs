//! Helpers for building PLY inputs on disk.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ply2colmap::{Progress, ProgressSink, Stage};

/// Header text for a vertex element with the given `(type, name)` fields.
pub fn header(encoding: &str, count: u64, fields: &[(&str, &str)]) -> String {
    let mut text = format!("ply\nformat {encoding} 1.0\ncomment test fixture\nelement vertex {count}\n");
    for (kind, name) in fields {
        text.push_str(&format!("property {kind} {name}\n"));
    }
    text.push_str("end_header\n");
    text
}

pub const XYZ_RGB: &[(&str, &str)] = &[
    ("float", "x"),
    ("float", "y"),
    ("float", "z"),
    ("uchar", "red"),
    ("uchar", "green"),
    ("uchar", "blue"),
];

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("Failed to write fixture");
    path
}

/// Binary body of `(xyz, rgb)` points laid out as `XYZ_RGB`.
pub fn binary_xyz_rgb(points: &[([f32; 3], [u8; 3])], big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(points.len() * 15);
    for (p, c) in points {
        for v in p {
            if big_endian {
                out.extend_from_slice(&v.to_be_bytes());
            } else {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out.extend_from_slice(c);
    }
    out
}

/// Data lines of an output file, header comments stripped.
pub fn data_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.starts_with('#')).collect()
}

/// Sink recording everything it is told.
#[derive(Default)]
pub struct Recorder {
    pub progress: Vec<Progress>,
    pub lines: Vec<String>,
    pub stages: Vec<Stage>,
}

impl ProgressSink for Recorder {
    fn progress(&mut self, progress: &Progress) {
        self.progress.push(*progress);
    }

    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn stage(&mut self, stage: Stage) {
        self.stages.push(stage);
    }
}
