use crate::config::CollisionConfig;

/// Overlaps smaller than this are treated as resolved.
const EPSILON: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Anchored boxes never move; their partner takes the full push.
    pub fixed: bool,
}

impl Bounds {
    fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOutcome {
    pub passes: usize,
    /// The last pass found no collisions.
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    X,
    Y,
}

/// How far `a` and `b` must separate along each axis to keep `min_distance`
/// between them. Both positive means they collide.
fn penetration(a: &Bounds, b: &Bounds, min_distance: f32) -> (f32, f32) {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let need_x = (a.width + b.width) / 2.0 + min_distance - (bx - ax).abs();
    let need_y = (a.height + b.height) / 2.0 + min_distance - (by - ay).abs();
    (need_x, need_y)
}

fn collides(a: &Bounds, b: &Bounds, min_distance: f32) -> bool {
    let (need_x, need_y) = penetration(a, b, min_distance);
    need_x > EPSILON && need_y > EPSILON
}

/// Number of pairs closer than `min_distance` on both axes.
pub fn count_collisions(bounds: &[Bounds], min_distance: f32) -> usize {
    let mut count = 0;
    for i in 0..bounds.len() {
        for j in (i + 1)..bounds.len() {
            if collides(&bounds[i], &bounds[j], min_distance) {
                count += 1;
            }
        }
    }
    count
}

/// Pushes overlapping boxes apart, preferring downward movement.
///
/// Each pass collects one displacement per colliding pair along the axis of
/// smaller penetration, scaled by `damping` and split between the pair, then
/// applies them all at once. Upward shares are reduced by
/// `upward_resistance` and the blocked part is added to the partner's
/// downward share.
pub fn resolve(bounds: &mut [Bounds], config: &CollisionConfig) -> ResolveOutcome {
    if bounds.len() < 2 {
        return ResolveOutcome {
            passes: 0,
            converged: true,
        };
    }
    let damping = config.damping.clamp(0.05, 1.0);
    let resistance = config.upward_resistance.clamp(0.0, 1.0);

    for pass in 0..config.iterations {
        let mut deltas = vec![(0.0f32, 0.0f32); bounds.len()];
        let mut collisions = 0usize;

        for i in 0..bounds.len() {
            for j in (i + 1)..bounds.len() {
                let (a, b) = (&bounds[i], &bounds[j]);
                if a.fixed && b.fixed {
                    continue;
                }
                let (need_x, need_y) = penetration(a, b, config.min_distance);
                if need_x <= EPSILON || need_y <= EPSILON {
                    continue;
                }
                collisions += 1;

                let (ax, ay) = a.center();
                let (bx, by) = b.center();
                let (axis, need, delta) = if need_x < need_y {
                    (Axis::X, need_x, bx - ax)
                } else {
                    (Axis::Y, need_y, by - ay)
                };
                // Coincident centers: the later box moves right/down.
                let sign = if delta.abs() < EPSILON || delta > 0.0 {
                    1.0
                } else {
                    -1.0
                };
                let push = need * damping;
                let (mut move_a, mut move_b) = match (a.fixed, b.fixed) {
                    (true, _) => (0.0, push),
                    (_, true) => (push, 0.0),
                    _ => (push / 2.0, push / 2.0),
                };

                if axis == Axis::Y && !a.fixed && !b.fixed {
                    // `a` moves by -sign, `b` by +sign: whichever goes up
                    // hands part of its share to the other.
                    if sign > 0.0 {
                        let blocked = move_a * resistance;
                        move_a -= blocked;
                        move_b += blocked;
                    } else {
                        let blocked = move_b * resistance;
                        move_b -= blocked;
                        move_a += blocked;
                    }
                }

                match axis {
                    Axis::X => {
                        deltas[i].0 -= sign * move_a;
                        deltas[j].0 += sign * move_b;
                    }
                    Axis::Y => {
                        deltas[i].1 -= sign * move_a;
                        deltas[j].1 += sign * move_b;
                    }
                }
            }
        }

        tracing::trace!(pass, collisions, "collision pass");
        if collisions == 0 {
            return ResolveOutcome {
                passes: pass,
                converged: true,
            };
        }
        for (bound, (dx, dy)) in bounds.iter_mut().zip(deltas) {
            if bound.fixed {
                continue;
            }
            bound.x += dx;
            bound.y += dy;
        }
    }

    ResolveOutcome {
        passes: config.iterations,
        converged: count_collisions(bounds, config.min_distance) == 0,
    }
}
