//! [embedded-graphics](embedded_graphics) support for rendered symbols.

use embedded_graphics::geometry::{Dimensions, Point, Size};
use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::{Drawable, Pixel};
use embedded_graphics::draw_target::DrawTarget;

use crate::builder::PDF417Render;
use crate::generators::row::Row;

/// A rendered symbol placed at `position`, drawing every module with the
/// `on` or `off` color.
#[derive(Debug, Clone)]
pub struct Pdf417Drawable<'a, R: Row<'a> + 'a, C: PixelColor> {
    render: PDF417Render<'a, R>,
    position: Point,
    on: C,
    off: C,
}

impl<'a, R: Row<'a> + 'a, C: PixelColor> Pdf417Drawable<'a, R, C> {
    pub fn new(render: PDF417Render<'a, R>, position: Point, on: C, off: C) -> Self {
        Self { render, position, on, off }
    }

    pub const fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }
}

impl<'a, R: Row<'a> + 'a, C: PixelColor> Dimensions for Pdf417Drawable<'a, R, C> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(self.position, Size::new(self.render.width(), self.render.height()))
    }
}

impl<'a, R: Row<'a> + 'a, C: PixelColor> Drawable for Pdf417Drawable<'a, R, C> {
    type Color = C;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let width = self.render.width();
        if width == 0 {
            return Ok(());
        }
        let origin = self.position;
        let (on, off) = (self.on, self.off);
        let pixels = self.render.bits().enumerate().map(move |(i, bit)| {
            let i = i as u32;
            let point = origin + Point::new((i % width) as i32, (i / width) as i32);
            Pixel(point, if bit { on } else { off })
        });
        target.draw_iter(pixels)
    }
}

impl<'a, R: Row<'a> + 'a> PDF417Render<'a, R> {
    /// Wraps the render into a [Drawable] placed at `position`.
    pub fn drawable<C: PixelColor>(self, position: Point, on: C, off: C) -> Pdf417Drawable<'a, R, C> {
        Pdf417Drawable::new(self, position, on, off)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_graphics::geometry::OriginDimensions;
    use embedded_graphics::pixelcolor::BinaryColor;

    use super::*;
    use crate::builder::{EncodeOptions, Symbol};

    struct Canvas {
        size: Size,
        pixels: Vec<(Point, BinaryColor)>,
    }

    impl OriginDimensions for Canvas {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for Canvas {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.pixels.extend(pixels.into_iter().map(|Pixel(point, color)| (point, color)));
            Ok(())
        }
    }

    #[test]
    fn test_draw_symbol() {
        let options = EncodeOptions::default().set_columns(2, 2);
        let symbol = Symbol::encode("drawable", &options).unwrap();
        let render = symbol.pdf417().render().set_scale((1, 2));
        let (width, height) = (render.width(), render.height());
        let expected: Vec<bool> = render.bits().collect();

        let drawable = render.drawable(Point::new(5, 7), BinaryColor::On, BinaryColor::Off);
        assert_eq!(drawable.bounding_box(), Rectangle::new(Point::new(5, 7), Size::new(width, height)));

        let mut canvas = Canvas { size: Size::new(width + 10, height + 10), pixels: Vec::new() };
        drawable.draw(&mut canvas).unwrap();

        assert_eq!(canvas.pixels.len(), (width * height) as usize);
        assert_eq!(canvas.pixels[0], (Point::new(5, 7), BinaryColor::On));
        let last = canvas.pixels.last().unwrap().0;
        assert_eq!(last, Point::new(5 + width as i32 - 1, 7 + height as i32 - 1));
        for ((_, color), bit) in canvas.pixels.iter().zip(expected) {
            assert_eq!(*color == BinaryColor::On, bit);
        }
    }
}
