/// Uniform gray image with `channels` interleaved channels.
pub fn flat_u8(width: usize, height: usize, channels: usize, value: u8) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    vec![value; width * height * channels]
}

/// Generates a simple high-contrast checkerboard image.
pub fn checkerboard_u8(width: usize, height: usize, cell: usize) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let sum = x / cell + y / cell;
            img[y * width + x] = if sum & 1 == 0 { 32u8 } else { 220u8 };
        }
    }
    img
}

/// Smooth left half, checkerboard right half; regions differ in sharpness.
pub fn half_textured_u8(width: usize, height: usize) -> Vec<u8> {
    let board = checkerboard_u8(width, height, 3);
    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            img[y * width + x] = if x < width / 2 {
                (x * 255 / width.max(1)) as u8
            } else {
                board[y * width + x]
            };
        }
    }
    img
}
