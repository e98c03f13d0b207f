use std::io::Cursor;

use anyhow::Context;
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

/// Turns a link into a scannable image.
pub trait CodeRenderer: Send + Sync {
    fn render(&self, text: &str) -> anyhow::Result<Vec<u8>>;
}

/// PNG QR code, black on white with the standard quiet zone.
#[derive(Debug, Clone)]
pub struct QrPngRenderer {
    module_px: u32,
}

impl Default for QrPngRenderer {
    fn default() -> Self {
        Self { module_px: 10 }
    }
}

impl CodeRenderer for QrPngRenderer {
    fn render(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)
            .map_err(|e| anyhow::anyhow!("encode qr code: {e}"))?;
        let img = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_px, self.module_px)
            .quiet_zone(true)
            .build();

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context("encode png")?;
        Ok(png)
    }
}
