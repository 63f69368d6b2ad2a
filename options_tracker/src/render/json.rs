//! Line-delimited JSON output, one document per applied snapshot.
use std::io::Write;

use options_common::Result;
use serde::Serialize;

use super::{Banner, DashboardView, DisplayRenderer};

#[derive(Serialize)]
struct Frame<'a> {
    banner: Banner,
    #[serde(flatten)]
    view: &'a DashboardView<'a>,
}

/// Writes each view as a single JSON line and flushes it.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        JsonRenderer { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplayRenderer for JsonRenderer<W> {
    fn render(&mut self, view: &DashboardView<'_>) -> Result<()> {
        let frame = Frame {
            banner: Banner::for_view(view),
            view,
        };
        let mut line = serde_json::to_vec(&frame)?;
        line.push(b'\n');
        self.out.write_all(&line)?;
        self.out.flush()?;
        Ok(())
    }
}
