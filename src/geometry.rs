//! Geometry and color primitives shared by the picker, capture and UI layers.

/// Monitor used when neither a real monitor nor any window geometry is known.
pub const FALLBACK_MONITOR: Rect = Rect::new(0, 0, 800, 600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub const fn has_area(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Flips negative extents so width and height are never negative.
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0 {
            (self.x.saturating_add(self.width), self.width.saturating_neg())
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0 {
            (self.y.saturating_add(self.height), self.height.saturating_neg())
        } else {
            (self.y, self.height)
        };
        Self::new(x, y, width, height)
    }

    /// Edge-inclusive containment, matching how picker rectangles are hit-tested.
    pub fn contains(self, point: Point) -> bool {
        let rect = self.normalized();
        rect.x <= point.x && point.x <= rect.right() && rect.y <= point.y && point.y <= rect.bottom()
    }

    pub fn center(self) -> Point {
        let rect = self.normalized();
        Point::new(rect.x + rect.width / 2, rect.y + rect.height / 2)
    }

    pub fn bounding_box<I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        let mut iter = rects.into_iter().map(Rect::normalized);
        let first = iter.next()?;
        let (min_x, min_y, max_x, max_y) = iter.fold(
            (first.x, first.y, first.right(), first.bottom()),
            |(min_x, min_y, max_x, max_y), rect| {
                (
                    min_x.min(rect.x),
                    min_y.min(rect.y),
                    max_x.max(rect.right()),
                    max_y.max(rect.bottom()),
                )
            },
        );
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Picks the monitor rectangle for a preview: the explicit one when usable,
/// otherwise the bounding box of the windows, otherwise [`FALLBACK_MONITOR`].
pub fn monitor_or_bounding_box<I>(explicit: Option<Rect>, windows: I) -> Rect
where
    I: IntoIterator<Item = Rect>,
{
    if let Some(monitor) = explicit.filter(|rect| rect.has_area()) {
        return monitor;
    }
    Rect::bounding_box(windows)
        .filter(|rect| rect.has_area())
        .unwrap_or(FALLBACK_MONITOR)
}

/// Linear mapping from monitor space into a fixed-size preview canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    scale_x: f64,
    scale_y: f64,
    origin_x: i32,
    origin_y: i32,
}

impl Projection {
    pub fn new(monitor: Rect, target_width: i32, target_height: i32) -> Self {
        let scale_x = if monitor.width != 0 {
            f64::from(target_width) / f64::from(monitor.width)
        } else {
            1.0
        };
        let scale_y = if monitor.height != 0 {
            f64::from(target_height) / f64::from(monitor.height)
        } else {
            1.0
        };
        Self {
            scale_x,
            scale_y,
            origin_x: monitor.x,
            origin_y: monitor.y,
        }
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    pub fn project(&self, rect: Rect) -> Rect {
        Rect::new(
            floor_to_i32(f64::from(rect.x - self.origin_x) * self.scale_x),
            floor_to_i32(f64::from(rect.y - self.origin_y) * self.scale_y),
            floor_to_i32(f64::from(rect.width) * self.scale_x),
            floor_to_i32(f64::from(rect.height) * self.scale_y),
        )
    }

    pub fn project_point(&self, point: Point) -> Point {
        Point::new(
            floor_to_i32(f64::from(point.x - self.origin_x) * self.scale_x),
            floor_to_i32(f64::from(point.y - self.origin_y) * self.scale_y),
        )
    }

    pub fn unproject(&self, point: Point) -> Point {
        Point::new(
            floor_to_i32(f64::from(point.x) / self.scale_x) + self.origin_x,
            floor_to_i32(f64::from(point.y) / self.scale_y) + self.origin_y,
        )
    }
}

pub fn project(rect: Rect, monitor: Rect, target: (i32, i32)) -> Rect {
    Projection::new(monitor, target.0, target.1).project(rect)
}

pub fn unproject(point: Point, monitor: Rect, target: (i32, i32)) -> Point {
    Projection::new(monitor, target.0, target.1).unproject(point)
}

fn floor_to_i32(value: f64) -> i32 {
    let floored = value.floor();
    if floored >= f64::from(i32::MAX) {
        i32::MAX
    } else if floored <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        floored as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Channels scaled to `0.0..=1.0` for cairo.
    pub fn unit(self) -> (f64, f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
            f64::from(self.a) / 255.0,
        )
    }
}
