//! Spread pattern for extra projectiles.

/// Yaw offsets in degrees for `extra` additional shots fanned across
/// `[-spread/2, +spread/2]`, both ends included.
///
/// `extra == 1` yields a single centred shot; `extra == 0` yields nothing.
pub fn spread_offsets(extra: u32, spread: f32) -> impl Iterator<Item = f32> {
    let start = -spread / 2.0;
    let step = if extra > 1 {
        spread / (extra - 1) as f32
    } else {
        0.0
    };
    (0..extra).map(move |i| {
        if extra == 1 {
            0.0
        } else {
            start + i as f32 * step
        }
    })
}
