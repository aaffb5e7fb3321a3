use crate::error::{Error, Result};
use crate::img::Rgba8Image;
use std::io::{Read, Write};

pub fn write_img(img: &Rgba8Image, output: impl Write) -> Result<()> {
    let mut encoder = png::Encoder::new(output, img.width(), img.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    tracing::trace!("Writing image data");
    writer.write_image_data(&img.as_bytes())?;
    writer.finish()?;
    Ok(())
}

/// Encodes the whole image in memory.
pub fn encode_img(img: &Rgba8Image) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_img(img, &mut buf)?;
    Ok(buf)
}

/// Decodes an 8-bit RGBA PNG, rejecting every other layout.
pub fn decode_img(input: impl Read) -> Result<Rgba8Image> {
    let decoder = png::Decoder::new(input);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
        return Err(Error::UnsupportedPng {
            color_type: info.color_type,
            bit_depth: info.bit_depth,
        });
    }
    buf.truncate(info.buffer_size());
    Ok(Rgba8Image::from_bytes(info.width, info.height, &buf))
}
