#![allow(dead_code)]

pub mod fragment_server;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ismdl_core::error::PipelineError;
use ismdl_core::mux::Muxer;
use ismdl_core::plan;

/// Muxer stand-in: concatenates the listed files, in list order, into `output`.
#[derive(Default, Clone)]
pub struct ConcatMuxer {
    pub calls: Arc<AtomicUsize>,
}

impl ConcatMuxer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Muxer for ConcatMuxer {
    fn mux(&self, list: &Path, output: &Path) -> Result<(), PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let plan = plan::read_list(list).map_err(|_| PipelineError::MuxerFailed { code: Some(2) })?;
        let dir = list.parent().unwrap_or_else(|| Path::new("."));
        let mut out = Vec::new();
        for name in plan.file_names() {
            let bytes =
                std::fs::read(dir.join(name)).map_err(|_| PipelineError::MuxerFailed { code: Some(1) })?;
            out.extend_from_slice(&bytes);
        }
        std::fs::write(output, out).map_err(|_| PipelineError::MuxerFailed { code: Some(3) })?;
        Ok(())
    }
}

/// HLS-style manifest text referencing `ids` in order.
pub fn manifest_text(ids: &[u64]) -> String {
    let mut s = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:2\n");
    for id in ids {
        s.push_str("#EXTINF:2.000000,no desc\n");
        s.push_str(&format!(
            "QualityLevels(3449984)/Fragments(video={},format=m3u8-aapl-v3,audiotrack=english)\n",
            id
        ));
    }
    s.push_str("#EXT-X-ENDLIST\n");
    s
}
