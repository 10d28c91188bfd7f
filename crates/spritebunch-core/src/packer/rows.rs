use crate::model::Rect;

/// Row ("shelf") packer: boxes go left to right, and a new row opens below the
/// tallest box of the current one when the next box does not fit horizontally.
///
/// Boxes are never rotated. Both axes use inclusive bounds: a box whose far edge
/// lands exactly on the interior edge fits.
#[derive(Debug, Clone)]
pub struct RowPacker {
    interior_w: u32,
    interior_h: u32,
    padding: u32,
    sheet_x: u32,
    sheet_y: u32,
    row_height: u32,
}

impl RowPacker {
    pub fn new(interior_w: u32, interior_h: u32, padding: u32) -> Self {
        Self {
            interior_w,
            interior_h,
            padding,
            sheet_x: 0,
            sheet_y: 0,
            row_height: 0,
        }
    }

    /// Current `(x, y)` cursor and the running height of the open row.
    pub fn cursor(&self) -> (u32, u32, u32) {
        (self.sheet_x, self.sheet_y, self.row_height)
    }

    /// Places a `w x h` sprite, returning its box (size includes padding).
    ///
    /// A sprite that fits neither the current row nor a fresh one returns `None`
    /// and leaves the cursor where it was.
    pub fn place(&mut self, w: u32, h: u32) -> Option<Rect> {
        let box_w = w as u64 + self.padding as u64;
        let box_h = h as u64 + self.padding as u64;
        let iw = self.interior_w as u64;
        let ih = self.interior_h as u64;

        if self.sheet_x as u64 + box_w <= iw {
            if self.sheet_y as u64 + box_h > ih {
                return None;
            }
            let rect = Rect::new(self.sheet_x, self.sheet_y, box_w as u32, box_h as u32);
            self.sheet_x += rect.w;
            self.row_height = self.row_height.max(rect.h);
            return Some(rect);
        }

        let next_row_y = self.sheet_y as u64 + self.row_height as u64;
        if next_row_y + box_h > ih || box_w > iw {
            return None;
        }
        self.sheet_x = 0;
        self.sheet_y = next_row_y as u32;
        let rect = Rect::new(0, self.sheet_y, box_w as u32, box_h as u32);
        self.sheet_x = rect.w;
        self.row_height = rect.h;
        Some(rect)
    }
}
