use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world units. `y` grows downward (screen space),
/// so `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// True when the rectangles overlap on the x axis only.
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.right() > other.x && self.x < other.right()
    }

    /// Circle overlap using the closest point of the rectangle to the center.
    pub fn overlaps_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        let nearest_x = cx.clamp(self.x, self.right());
        let nearest_y = cy.clamp(self.y, self.bottom());
        let dx = cx - nearest_x;
        let dy = cy - nearest_y;
        dx * dx + dy * dy < radius * radius
    }

    /// Minimum translation that moves `self` out of `solid`, or `None` when
    /// they do not overlap. Resolves along the axis of least penetration.
    pub fn push_out_of(&self, solid: &Rect) -> Option<Push> {
        if !self.overlaps(solid) {
            return None;
        }

        let overlap_left = self.right() - solid.x;
        let overlap_right = solid.right() - self.x;
        let overlap_top = self.bottom() - solid.y;
        let overlap_bottom = solid.bottom() - self.y;

        let min_overlap = overlap_left
            .min(overlap_right)
            .min(overlap_top)
            .min(overlap_bottom);

        let push = if min_overlap == overlap_top {
            Push {
                dx: 0.0,
                dy: -overlap_top,
            }
        } else if min_overlap == overlap_bottom {
            Push {
                dx: 0.0,
                dy: overlap_bottom,
            }
        } else if min_overlap == overlap_left {
            Push {
                dx: -overlap_left,
                dy: 0.0,
            }
        } else {
            Push {
                dx: overlap_right,
                dy: 0.0,
            }
        };
        Some(push)
    }
}

/// Separation vector produced by [`Rect::push_out_of`]. Exactly one
/// component is non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Push {
    pub dx: f32,
    pub dy: f32,
}

impl Push {
    pub fn is_vertical(&self) -> bool {
        self.dy != 0.0
    }

    /// Pushed upward, i.e. the body came to rest on top of the solid.
    pub fn lands(&self) -> bool {
        self.dy < 0.0
    }
}

/// A triangle given by three vertices in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: (f32, f32),
    pub b: (f32, f32),
    pub c: (f32, f32),
}

impl Triangle {
    pub const fn new(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> Self {
        Self { a, b, c }
    }

    /// Separating-axis test against an axis-aligned rectangle. Touching
    /// shapes are not considered overlapping.
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.right(), rect.bottom()),
            (rect.x, rect.bottom()),
        ];
        let verts = [self.a, self.b, self.c];

        let mut axes = vec![(1.0, 0.0), (0.0, 1.0)];
        for i in 0..3 {
            let (x1, y1) = verts[i];
            let (x2, y2) = verts[(i + 1) % 3];
            axes.push((-(y2 - y1), x2 - x1));
        }

        axes.into_iter().all(|axis| {
            let (tri_min, tri_max) = project(&verts, axis);
            let (rect_min, rect_max) = project(&corners, axis);
            tri_max > rect_min && rect_max > tri_min
        })
    }
}

fn project(points: &[(f32, f32)], axis: (f32, f32)) -> (f32, f32) {
    points
        .iter()
        .map(|&(x, y)| x * axis.0 + y * axis.1)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_contact_is_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(9.0, 9.0, 5.0, 5.0)));
    }

    #[test]
    fn push_out_prefers_shallowest_axis() {
        let solid = Rect::new(0.0, 100.0, 200.0, 20.0);
        // Feet sunk 3 units into the top of the solid.
        let body = Rect::new(50.0, 53.0, 50.0, 50.0);
        let push = body.push_out_of(&solid).unwrap();
        assert_eq!(push, Push { dx: 0.0, dy: -3.0 });
        assert!(push.lands());

        // Overlapping the left edge by 4 units.
        let side = Rect::new(-46.0, 105.0, 50.0, 10.0);
        let push = side.push_out_of(&solid).unwrap();
        assert_eq!(push.dx, -4.0);
        assert!(!push.is_vertical());
    }

    #[test]
    fn push_out_none_when_apart() {
        let solid = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(Rect::new(20.0, 20.0, 5.0, 5.0).push_out_of(&solid).is_none());
    }

    #[test]
    fn circle_overlap_uses_closest_point() {
        let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert!(rect.overlaps_circle(55.0, 25.0, 10.0));
        // Near the corner but outside the radius diagonally.
        assert!(!rect.overlaps_circle(58.0, 58.0, 10.0));
    }

    #[test]
    fn triangle_rect_overlap() {
        // Upward spike: base on y=100 from x=0..40, apex at (20, 80).
        let tri = Triangle::new((0.0, 100.0), (40.0, 100.0), (20.0, 80.0));
        assert!(tri.overlaps_rect(&Rect::new(10.0, 60.0, 20.0, 25.0)));
        // Above the apex.
        assert!(!tri.overlaps_rect(&Rect::new(10.0, 20.0, 20.0, 50.0)));
        // Inside the bounding box corner but outside the slanted edge.
        assert!(!tri.overlaps_rect(&Rect::new(0.0, 78.0, 3.0, 3.0)));
    }
}
