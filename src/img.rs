/// Single-channel 16-bit image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    /// Splits a depth value into red (high byte) and green (low byte).
    pub fn from_depth(value: u16) -> Self {
        Rgba8 {
            r: (value / 256) as u8,
            g: (value % 256) as u8,
            b: 0,
            a: 255,
        }
    }

    pub fn depth(&self) -> u16 {
        u16::from(self.r) * 256 + u16::from(self.g)
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_bytes([r, g, b, a]: [u8; 4]) -> Self {
        Rgba8 { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgba8Image {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl Rgba8Image {
    pub fn new(width: u32, height: u32) -> Self {
        Rgba8Image {
            width,
            height,
            pixels: vec![Rgba8::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Rgba8) {
        let i = self.index(x, y);
        self.pixels[i] = pixel;
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba8 {
        self.pixels[self.index(x, y)]
    }

    /// Interleaved RGBA bytes as expected by the PNG encoder.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_bytes()).collect()
    }

    /// Caller guarantees `bytes.len() == width * height * 4`.
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Self {
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| Rgba8::from_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Rgba8Image {
            width,
            height,
            pixels,
        }
    }
}

impl DepthImage {
    pub fn to_rgba8(&self) -> Rgba8Image {
        let mut out = Rgba8Image::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let index = y as usize * self.width as usize + x as usize;
                out.put_pixel(x, y, Rgba8::from_depth(self.data[index]));
            }
        }
        out
    }

    pub fn from_rgba8(img: &Rgba8Image) -> Self {
        let mut data = Vec::with_capacity(img.width() as usize * img.height() as usize);
        for y in 0..img.height() {
            for x in 0..img.width() {
                data.push(img.get_pixel(x, y).depth());
            }
        }
        DepthImage {
            width: img.width(),
            height: img.height(),
            data,
        }
    }

    pub fn min_max(&self) -> Option<(u16, u16)> {
        let min = *self.data.iter().min()?;
        let max = *self.data.iter().max()?;
        Some((min, max))
    }
}
