// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet codec. Binary PBM (P4) is packed and unpacked here so bilevel sheets
// keep their depth tag; every other format goes through the `image` crate and
// arrives as 8-bit grayscale.

use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use pagewash_core::ColorDepth;
use pagewash_core::error::{PagewashError, Result};
use tracing::{debug, info, instrument};

use crate::canvas::{BLACK, Canvas, WHITE};

const PBM_MAGIC: &[u8] = b"P4";

// -- PBM ----------------------------------------------------------------------

/// Read the next whitespace-delimited header token, skipping `#` comments.
fn header_token<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    loop {
        while *pos < data.len() && data[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        if *pos < data.len() && data[*pos] == b'#' {
            while *pos < data.len() && data[*pos] != b'\n' {
                *pos += 1;
            }
            continue;
        }
        break;
    }
    let start = *pos;
    while *pos < data.len() && !data[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        return Err(PagewashError::ImageError("truncated PBM header".into()));
    }
    Ok(&data[start..*pos])
}

fn header_number(data: &[u8], pos: &mut usize) -> Result<u32> {
    let token = header_token(data, pos)?;
    std::str::from_utf8(token)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| {
            PagewashError::ImageError(format!(
                "invalid PBM dimension '{}'",
                String::from_utf8_lossy(token)
            ))
        })
}

/// Unpack a binary PBM. Set bits are black.
pub fn decode_pbm(data: &[u8]) -> Result<Canvas> {
    let mut pos = 0;
    if header_token(data, &mut pos)? != PBM_MAGIC {
        return Err(PagewashError::UnsupportedFormat("not a binary PBM".into()));
    }
    let width = header_number(data, &mut pos)?;
    let height = header_number(data, &mut pos)?;
    // Exactly one whitespace byte separates the header from the raster.
    pos += 1;

    let bytes_per_row = (width as usize).div_ceil(8);
    let needed = bytes_per_row * height as usize;
    let raster = data.get(pos..).unwrap_or_default();
    if raster.len() < needed {
        return Err(PagewashError::ImageError(format!(
            "PBM raster truncated: {} of {} bytes",
            raster.len(),
            needed
        )));
    }

    let mut canvas = Canvas::new(width, height, ColorDepth::Bilevel)?;
    for (y, row) in raster.chunks_exact(bytes_per_row).take(height as usize).enumerate() {
        for x in 0..width as usize {
            if row[x >> 3] & (0x80 >> (x & 7)) != 0 {
                canvas.set(x as i32, y as i32, BLACK);
            }
        }
    }
    Ok(canvas)
}

/// Pack `canvas` as a binary PBM; pixels darker than `cutoff` become black.
pub fn encode_pbm(canvas: &Canvas, cutoff: u8) -> Vec<u8> {
    let (width, height) = (canvas.width() as usize, canvas.height() as usize);
    let bytes_per_row = width.div_ceil(8);
    let mut data = format!("P4\n# generated by pagewash\n{width} {height}\n").into_bytes();
    let header_len = data.len();
    data.resize(header_len + bytes_per_row * height, 0);

    for (y, row) in canvas.pixels().chunks_exact(width).enumerate() {
        let packed = &mut data[header_len + y * bytes_per_row..][..bytes_per_row];
        for (x, pixel) in row.iter().enumerate() {
            if *pixel < cutoff {
                packed[x >> 3] |= 0x80 >> (x & 7);
            }
        }
    }
    data
}

// -- Files --------------------------------------------------------------------

/// Load a sheet. A missing file is reported as [`PagewashError::InputNotFound`].
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_canvas(path: impl AsRef<Path>) -> Result<Canvas> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => PagewashError::InputNotFound {
            path: path.display().to_string(),
        },
        _ => PagewashError::Io(err),
    })?;

    let canvas = if data.starts_with(PBM_MAGIC) {
        decode_pbm(&data)?
    } else {
        let img = image::load_from_memory(&data).map_err(|err| {
            PagewashError::ImageError(format!("failed to open {}: {}", path.display(), err))
        })?;
        Canvas::from_gray_image(img.to_luma8(), ColorDepth::Grayscale)?
    };
    info!(
        width = canvas.width(),
        height = canvas.height(),
        depth = ?canvas.depth(),
        "Sheet loaded"
    );
    Ok(canvas)
}

/// Save a sheet at the requested depth.
///
/// Bilevel output is always PBM, thresholded at `255 * (1 - black_threshold)`.
/// Grayscale output is PGM for `.pgm`, `.pnm` or no extension, otherwise the
/// format named by the extension.
#[instrument(skip(canvas), fields(path = %path.as_ref().display()))]
pub fn save_canvas(
    canvas: &Canvas,
    path: impl AsRef<Path>,
    depth: ColorDepth,
    black_threshold: f64,
) -> Result<()> {
    let path = path.as_ref();
    let data = match depth {
        ColorDepth::Bilevel => {
            let cutoff = (WHITE as f64 * (1.0 - black_threshold)) as u8;
            encode_pbm(canvas, cutoff)
        }
        ColorDepth::Grayscale => {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);
            match extension.as_deref() {
                None | Some("pgm") | Some("pnm") => encode_pgm(canvas)?,
                Some(_) => {
                    let format = ImageFormat::from_path(path).map_err(|err| {
                        PagewashError::UnsupportedFormat(format!("{}: {}", path.display(), err))
                    })?;
                    encode_to_format(canvas, format)?
                }
            }
        }
    };
    std::fs::write(path, &data)?;
    debug!(bytes = data.len(), "Sheet written");
    Ok(())
}

fn encode_pgm(canvas: &Canvas) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = PnmEncoder::new(&mut buffer).with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary));
    canvas
        .to_gray_image()
        .write_with_encoder(encoder)
        .map_err(|err| PagewashError::ImageError(format!("PGM encoding failed: {}", err)))?;
    Ok(buffer)
}

fn encode_to_format(canvas: &Canvas, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    canvas
        .to_gray_image()
        .write_to(&mut cursor, format)
        .map_err(|err| PagewashError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
