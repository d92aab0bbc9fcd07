//! Receipt service - QR codes and PDF tickets proving a booking exists.
//!
//! This service handles:
//! - Rendering the booking summary as a PNG QR code
//! - Writing the QR image under the media root and returning its reference
//! - Rendering a one-page PDF ticket on demand
//!
//! Receipts are never required for a booking to be valid. Creation logs a failed
//! render and carries on.

use std::{io::Cursor, path::PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Luma};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use qrcode::QrCode;

use crate::{
    config::SlotSettings,
    models::booking::{Booking, TIME_FORMAT},
};

/// Sub-directory of the media root holding QR images.
pub const QR_DIR: &str = "qr_codes";

/// Errors raised while rendering or storing a receipt.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("QR encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("could not write receipt: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces the artifacts attached to a booking.
#[async_trait]
pub trait ReceiptRenderer: Send + Sync {
    /// Render and store the QR receipt; returns its reference relative to the media root.
    async fn render_receipt(
        &self,
        booking: &Booking,
        settings: &SlotSettings,
    ) -> Result<String, ReceiptError>;

    /// Render a PDF ticket.
    fn render_ticket(
        &self,
        booking: &Booking,
        settings: &SlotSettings,
    ) -> Result<Vec<u8>, ReceiptError>;
}

/// Renders QR codes to PNG files under `media_root` and tickets to PDF.
#[derive(Debug, Clone)]
pub struct QrReceiptRenderer {
    media_root: PathBuf,
}

impl QrReceiptRenderer {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }
}

#[async_trait]
impl ReceiptRenderer for QrReceiptRenderer {
    async fn render_receipt(
        &self,
        booking: &Booking,
        settings: &SlotSettings,
    ) -> Result<String, ReceiptError> {
        let png = qr_png(&receipt_payload(booking, settings))?;

        let reference = format!("{QR_DIR}/qr_{}.png", booking.id);
        let path = self.media_root.join(&reference);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, png).await?;

        tracing::debug!(booking_id = %booking.id, path = %path.display(), "QR receipt written");
        Ok(reference)
    }

    fn render_ticket(
        &self,
        booking: &Booking,
        settings: &SlotSettings,
    ) -> Result<Vec<u8>, ReceiptError> {
        ticket_pdf(booking, settings)
    }
}

/// Text encoded in the QR code.
pub fn receipt_payload(booking: &Booking, settings: &SlotSettings) -> String {
    format!(
        "Booking for {} ({}) from {} to {}",
        booking.name,
        booking.civil_id,
        booking.local_start(settings).format(TIME_FORMAT),
        booking.local_end(settings).format(TIME_FORMAT),
    )
}

/// Encode `payload` as a PNG QR code.
pub fn qr_png(payload: &str) -> Result<Vec<u8>, ReceiptError> {
    let code = QrCode::new(payload.as_bytes())?;
    let image = code.render::<Luma<u8>>().min_dimensions(200, 200).build();

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// A6 page with the booking details.
fn ticket_pdf(booking: &Booking, settings: &SlotSettings) -> Result<Vec<u8>, ReceiptError> {
    let (doc, page, layer) = PdfDocument::new("Booking ticket", Mm(105.0), Mm(148.0), "ticket");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReceiptError::Pdf(format!("{e:?}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReceiptError::Pdf(format!("{e:?}")))?;

    let layer = doc.get_page(page).get_layer(layer);
    layer.use_text("Booking ticket", 18.0, Mm(10.0), Mm(130.0), &bold);

    let lines = [
        format!("Name: {}", booking.name),
        format!("Civil ID: {}", booking.civil_id),
        format!("From: {}", booking.local_start(settings).format(TIME_FORMAT)),
        format!("To: {}", booking.local_end(settings).format(TIME_FORMAT)),
        format!("Reference: {}", booking.id),
    ];
    for (i, line) in lines.iter().enumerate() {
        let y = 112.0 - 10.0 * i as f32;
        layer.use_text(line.as_str(), 11.0, Mm(10.0), Mm(y), &font);
    }

    doc.save_to_bytes()
        .map_err(|e| ReceiptError::Pdf(format!("{e:?}")))
}
