use crate::segmentation::NormalizedPoint;
use crate::surface::Surface;
use image::Rgba;

/// Side length of every resize handle, independent of object size
pub const HANDLE_SIZE: f32 = 20.0;

/// Smallest width/height a frame can be resized to
pub const MIN_FRAME_SIZE: f32 = 1.0;

const BORDER_WIDTH: f32 = 5.0;
const BORDER_COLOR: Rgba<u8> = Rgba([255, 192, 203, 255]);
const HANDLE_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Which corner of a frame a handle sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Fixed handle order used by [`Frame::compute_handles`]
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Opposite corners share the same diagonal cursor
    pub fn cursor(self) -> ResizeCursor {
        match self {
            Corner::TopLeft | Corner::BottomRight => ResizeCursor::NwseResize,
            Corner::TopRight | Corner::BottomLeft => ResizeCursor::NeswResize,
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

/// Pointer affordance shown while hovering a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeCursor {
    NwseResize,
    NeswResize,
}

impl ResizeCursor {
    /// CSS cursor name
    pub fn as_str(self) -> &'static str {
        match self {
            ResizeCursor::NwseResize => "nwse-resize",
            ResizeCursor::NeswResize => "nesw-resize",
        }
    }
}

/// A square resize marker centred on one corner of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub cursor: ResizeCursor,
    pub corner: Corner,
}

impl Handle {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.size && py >= self.y && py <= self.y + self.size
    }
}

/// Geometry shared by every media object on the canvas.
///
/// Fields are private so the handles can only change together with the
/// geometry they are derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    z: i32,
    handles: [Handle; 4],
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let width = width.max(MIN_FRAME_SIZE);
        let height = height.max(MIN_FRAME_SIZE);
        Self {
            x,
            y,
            width,
            height,
            z: 0,
            handles: compute_handles(x, y, width, height),
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn set_z(&mut self, z: i32) {
        self.z = z;
    }

    pub fn handles(&self) -> &[Handle; 4] {
        &self.handles
    }

    /// Derive the four handles from the current geometry, in
    /// top-left, top-right, bottom-left, bottom-right order
    pub fn compute_handles(&self) -> [Handle; 4] {
        compute_handles(self.x, self.y, self.width, self.height)
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.set_geometry(x, y, self.width, self.height);
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.set_geometry(self.x + dx, self.y + dy, self.width, self.height);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.set_geometry(self.x, self.y, width, height);
    }

    /// Replace the whole geometry; sizes below [`MIN_FRAME_SIZE`] are clamped
    pub fn set_geometry(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.x = x;
        self.y = y;
        self.width = width.max(MIN_FRAME_SIZE);
        self.height = height.max(MIN_FRAME_SIZE);
        self.handles = self.compute_handles();
    }

    /// Rounded raster size used for off-screen rendering, never below 1x1
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width.round() as u32).max(1),
            (self.height.round() as u32).max(1),
        )
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// The handle under a canvas position, if any
    pub fn handle_at(&self, px: f32, py: f32) -> Option<Corner> {
        self.handles
            .iter()
            .find(|handle| handle.contains(px, py))
            .map(|handle| handle.corner)
    }

    /// Resize by dragging `corner` to (px, py) while the opposite corner
    /// stays where it is
    pub fn drag_corner(&mut self, corner: Corner, px: f32, py: f32) {
        let (anchor_x, anchor_y) = self.corner_position(corner.opposite());

        let (x, width) = match corner {
            Corner::TopLeft | Corner::BottomLeft => {
                let width = (anchor_x - px).max(MIN_FRAME_SIZE);
                (anchor_x - width, width)
            }
            Corner::TopRight | Corner::BottomRight => (anchor_x, (px - anchor_x).max(MIN_FRAME_SIZE)),
        };
        let (y, height) = match corner {
            Corner::TopLeft | Corner::TopRight => {
                let height = (anchor_y - py).max(MIN_FRAME_SIZE);
                (anchor_y - height, height)
            }
            Corner::BottomLeft | Corner::BottomRight => (anchor_y, (py - anchor_y).max(MIN_FRAME_SIZE)),
        };

        self.set_geometry(x, y, width, height);
    }

    pub fn corner_position(&self, corner: Corner) -> (f32, f32) {
        match corner {
            Corner::TopLeft => (self.x, self.y),
            Corner::TopRight => (self.x + self.width, self.y),
            Corner::BottomLeft => (self.x, self.y + self.height),
            Corner::BottomRight => (self.x + self.width, self.y + self.height),
        }
    }

    /// Map a canvas position into this frame's normalized [0, 1] space.
    ///
    /// Normalization is against the object's own size, so the result does
    /// not depend on how the canvas is scaled on screen.
    pub fn normalize(&self, px: f32, py: f32) -> Option<NormalizedPoint> {
        if !self.contains(px, py) {
            return None;
        }
        Some(NormalizedPoint::new(
            (px - self.x) / self.width,
            (py - self.y) / self.height,
        ))
    }

    /// Selection border plus the four handles
    pub fn draw_border_and_handles(&self, surface: &mut Surface) {
        surface.stroke_rect(
            self.x,
            self.y,
            self.width,
            self.height,
            BORDER_WIDTH,
            BORDER_COLOR,
        );

        for handle in &self.handles {
            surface.fill_rect(handle.x, handle.y, handle.size, handle.size, HANDLE_COLOR);
        }
    }
}

fn compute_handles(x: f32, y: f32, width: f32, height: f32) -> [Handle; 4] {
    let half = HANDLE_SIZE / 2.0;
    Corner::ALL.map(|corner| {
        let (cx, cy) = match corner {
            Corner::TopLeft => (x, y),
            Corner::TopRight => (x + width, y),
            Corner::BottomLeft => (x, y + height),
            Corner::BottomRight => (x + width, y + height),
        };
        Handle {
            x: cx - half,
            y: cy - half,
            size: HANDLE_SIZE,
            cursor: corner.cursor(),
            corner,
        }
    })
}
