// Reading and writing DMI files: RGBA PNGs carrying the descriptor in a
// `Description` text chunk

use image::{ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::{DmiError, DmiResult};

pub const DESCRIPTION_KEY: &str = "Description";

fn find_description(info: &png::Info) -> DmiResult<Option<String>> {
    if let Some(chunk) = info
        .compressed_latin1_text
        .iter()
        .find(|c| c.keyword == DESCRIPTION_KEY)
    {
        return Ok(Some(chunk.get_text()?));
    }

    if let Some(chunk) = info
        .uncompressed_latin1_text
        .iter()
        .find(|c| c.keyword == DESCRIPTION_KEY)
    {
        return Ok(Some(chunk.text.clone()));
    }

    if let Some(chunk) = info.utf8_text.iter().find(|c| c.keyword == DESCRIPTION_KEY) {
        return Ok(Some(chunk.get_text()?));
    }

    Ok(None)
}

/// Pulls the `Description` text out of a PNG, looking at `zTXt`, `tEXt` and
/// `iTXt` chunks.
pub fn read_description(bytes: &[u8]) -> DmiResult<String> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let mut reader = decoder.read_info()?;

    if let Some(text) = find_description(reader.info())? {
        return Ok(text);
    }

    // Text chunks placed after the image data only show up once it is read
    let mut buf = vec![0; reader.output_buffer_size()];
    reader.next_frame(&mut buf)?;
    reader.finish()?;

    find_description(reader.info())?.ok_or(DmiError::MissingDescription)
}

pub fn read_dmi_bytes(bytes: &[u8]) -> DmiResult<(RgbaImage, String)> {
    let description = read_description(bytes)?;
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
    Ok((image, description))
}

pub fn read_dmi(path: &Path) -> DmiResult<(RgbaImage, String)> {
    let data = fs::read(path)?;
    read_dmi_bytes(&data)
}

/// Encodes `image` as an RGBA PNG with `description` stored losslessly in a
/// compressed text chunk ahead of the image data.
pub fn encode_dmi(image: &RgbaImage, description: &str) -> DmiResult<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.add_ztxt_chunk(DESCRIPTION_KEY.to_string(), description.to_string())?;

        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;
    }
    Ok(out)
}

pub fn write_dmi(path: &Path, image: &RgbaImage, description: &str) -> DmiResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = encode_dmi(image, description)?;
    fs::write(path, data)?;
    Ok(())
}
