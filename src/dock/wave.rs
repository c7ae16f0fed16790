//! Linear wave placement.
//!
//! The icon under the cursor is magnified by a half-sine bump whose width is
//! `sinusoid_width`; its neighbours are laid out from it outwards so that the
//! row stays packed, then pulled back inside the extrema found by
//! [`max_dock_width`] so that a zoomed row never leaves its window.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::config::Config;
use crate::icon::{Icon, IconGroup};

/// Geometry constants of the wave, read once from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveStyle {
    pub gap: f64,
    pub sinusoid_width: f64,
    pub amplitude: f64,
    pub line_width: f64,
    pub frame_margin: f64,
    pub radius: f64,
}

impl WaveStyle {
    pub fn from_config(config: &Config) -> Self {
        Self {
            gap: config.icons.icon_gap,
            sinusoid_width: config.icons.sinusoid_width,
            amplitude: config.icons.amplitude,
            line_width: config.dock.line_width,
            frame_margin: config.dock.frame_margin,
            radius: config.dock.radius,
        }
    }
}

/// One evaluation of the wave.
///
/// `width` and `height` are the window size; a zero width switches to the
/// max-size sweep, where the cursor is not clamped and no extremum
/// constraint applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveInput {
    pub x_abs: f64,
    pub magnitude: f64,
    pub flat_width: f64,
    pub width: f64,
    pub height: f64,
    pub align: f64,
    pub folding: f64,
    pub direction_up: bool,
}

/// Lays the icons side by side with no zoom, starting at 0.
pub fn positions_at_rest(icons: &mut [Icon], flat_width: f64, gap: f64) {
    let mut x_cumulated = 0.0;
    for icon in icons.iter_mut() {
        let middle = x_cumulated + icon.width / 2.0;
        icon.x_at_rest = if middle < 0.0 {
            x_cumulated + flat_width
        } else if middle > flat_width {
            x_cumulated - flat_width
        } else {
            x_cumulated
        };
        x_cumulated += icon.width + gap;
    }
}

fn phase(distance: f64, sinusoid_width: f64) -> f64 {
    if sinusoid_width <= 0.0 {
        return if distance > 0.0 {
            PI
        } else if distance < 0.0 {
            0.0
        } else {
            FRAC_PI_2
        };
    }
    (distance / sinusoid_width * PI + FRAC_PI_2).clamp(0.0, PI)
}

// Exact zero on both ends so that icons out of reach keep a scale of 1.
fn bump(phase: f64) -> f64 {
    if phase <= 0.0 || phase >= PI {
        0.0
    } else {
        phase.sin()
    }
}

/// Scale of an icon whose middle is `distance` away from the cursor.
pub fn bump_scale(distance: f64, magnitude: f64, style: &WaveStyle) -> f64 {
    1.0 + magnitude * style.amplitude * bump(phase(distance, style.sinusoid_width))
}

/// Computes scale, phase and draw position of every icon for a cursor at
/// `input.x_abs` on the flat row, and returns the pointed icon if any.
pub fn wave_with_position(icons: &mut [Icon], style: &WaveStyle, input: &WaveInput) -> Option<usize> {
    let last = icons.len().checked_sub(1)?;

    let gap = style.gap;
    let amplitude = style.amplitude;
    let magnitude = input.magnitude;
    let flat_width = input.flat_width;
    let width = input.width;
    let fold = |x: f64| input.align * width + (x - input.align * width) * (1.0 - input.folding);

    let mut x_abs = input.x_abs.trunc();
    if width > 0.0 {
        if x_abs < 0.0 {
            x_abs = 0.0;
        } else if x_abs > flat_width {
            x_abs = flat_width.trunc();
        }
    }

    let mut pointed: Option<usize> = if x_abs < 0.0 { Some(0) } else { None };
    let mut offset = 0.0;

    for i in 0..icons.len() {
        let (prev_x, prev_width, prev_scale) = if i > 0 {
            let prev = &icons[i - 1];
            (prev.x_draw, prev.width, prev.scale)
        } else {
            (0.0, 0.0, 0.0)
        };

        let icon = &mut icons[i];
        let x_cumulated = icon.x_at_rest;
        let middle = x_cumulated + icon.width / 2.0;

        icon.phase = phase(middle - x_abs, style.sinusoid_width);
        icon.scale = 1.0 + magnitude * amplitude * bump(icon.phase);
        let unscaled = icon.scale;
        let insert_remove = width > 0.0 && icon.personal_scale != 0.0;
        if insert_remove {
            if icon.personal_scale > 0.0 {
                icon.scale *= icon.personal_scale;
            } else {
                icon.scale *= 1.0 + icon.personal_scale;
            }
        }

        icon.y_draw = if input.direction_up {
            input.height - style.line_width - style.frame_margin - icon.scale * icon.height
        } else {
            style.line_width + style.frame_margin
        };

        if pointed.is_some() {
            if i == 0 {
                icon.x_draw = x_cumulated - (flat_width - width) / 2.0;
            } else {
                icon.x_draw = prev_x + (prev_width + gap) * prev_scale;
                let bound = amplitude * magnitude * (icon.width + 1.5 * gap);
                if width != 0.0 && icon.x_draw + icon.width * icon.scale > icon.x_max - bound / 8.0 {
                    let delta = icon.x_draw + icon.width * icon.scale - (icon.x_max - bound / 16.0);
                    if amplitude != 0.0 {
                        icon.x_draw -= delta * (1.0 - (icon.scale - 1.0) / amplitude) * magnitude;
                    }
                }
            }
            icon.x_draw = fold(icon.x_draw);
        }

        if pointed.is_none()
            && x_cumulated + icon.width + 0.5 * gap >= x_abs
            && x_cumulated - 0.5 * gap <= x_abs
        {
            pointed = Some(i);
            icon.is_pointed = input.x_abs > 0.0 && input.x_abs < flat_width;
            icon.x_draw = x_cumulated - (flat_width - width) / 2.0
                + (1.0 - icon.scale) * (x_abs - x_cumulated + 0.5 * gap);
            icon.x_draw = fold(icon.x_draw);
        } else {
            icon.is_pointed = false;
        }

        if insert_remove {
            let sign = if pointed.is_none() { 1.0 } else { -1.0 };
            if pointed != Some(i) {
                offset += icon.width * (unscaled - icon.scale) * sign;
            } else {
                offset += 2.0 * (middle - x_abs) * (unscaled - icon.scale) * sign;
            }
        }
    }

    let pointed = match pointed {
        Some(index) => index,
        None => {
            // beyond the last icon
            let icon = &mut icons[last];
            icon.x_draw = icon.x_at_rest - (flat_width - width) / 2.0
                + (1.0 - icon.scale) * (icon.width + 0.5 * gap);
            icon.x_draw = fold(icon.x_draw);
            last
        }
    };

    for i in (1..=pointed).rev() {
        let next_x = icons[i].x_draw;
        let prev = &mut icons[i - 1];
        prev.x_draw = next_x - (prev.width + gap) * prev.scale;
        let bound = amplitude * magnitude * (prev.width + 1.5 * gap);
        if prev.x_draw < prev.x_min + bound / 8.0 && width != 0.0 && x_abs < width && magnitude > 0.0 {
            let delta = prev.x_draw - (prev.x_min + bound / 16.0);
            if amplitude != 0.0 {
                prev.x_draw -= delta * (1.0 - (prev.scale - 1.0) / amplitude) * magnitude;
            }
        }
        prev.x_draw = fold(prev.x_draw);
    }

    if offset != 0.0 {
        offset /= 2.0;
        for icon in icons.iter_mut() {
            icon.x_draw -= offset;
        }
    }

    icons[pointed].is_pointed.then_some(pointed)
}

/// Sweeps the cursor across the whole row at full magnitude to find the
/// widest the row can get, and records each icon's `x_min`/`x_max` in window
/// coordinates. Leaves the icons at rest.
pub fn max_dock_width(
    icons: &mut [Icon],
    style: &WaveStyle,
    flat_width: f64,
    magnitude_max: f64,
    extra_width: f64,
    direction_up: bool,
) -> f64 {
    if icons.is_empty() {
        return 2.0 * style.radius + style.line_width + 2.0 * style.frame_margin;
    }

    for icon in icons.iter_mut() {
        icon.x_max = -1e4;
        icon.x_min = 1e4;
    }

    let mut sweep = WaveInput {
        x_abs: 0.0,
        magnitude: magnitude_max,
        flat_width,
        width: 0.0,
        height: 0.0,
        align: 0.5,
        folding: 0.0,
        direction_up,
    };
    for i in 0..icons.len() {
        sweep.x_abs = icons[i].x_at_rest;
        wave_with_position(icons, style, &sweep);
        record_extrema(icons);
    }
    sweep.x_abs = flat_width - 1.0;
    wave_with_position(icons, style, &sweep);
    record_extrema(icons);

    let first_min = icons[0].x_min;
    let last_max = icons[icons.len() - 1].x_max;
    let max_width = (last_max - first_min + extra_width).ceil() + 1.0;

    for icon in icons.iter_mut() {
        icon.x_min += max_width / 2.0;
        icon.x_max += max_width / 2.0;
        icon.reset_to_rest();
    }
    max_width
}

fn record_extrema(icons: &mut [Icon]) {
    for icon in icons.iter_mut() {
        let right = icon.x_draw + icon.width * icon.scale;
        if right > icon.x_max {
            icon.x_max = right;
        }
        if icon.x_draw < icon.x_min {
            icon.x_min = icon.x_draw;
        }
    }
}

/// Width of the frame around the icons as currently drawn.
pub fn current_dock_width(icons: &[Icon], frame_margin: f64) -> f64 {
    match (icons.first(), icons.last()) {
        (Some(first), Some(last)) => {
            last.x_draw - first.x_draw + last.width * last.scale + 2.0 * frame_margin
        }
        _ => 1.0 + 2.0 * frame_margin,
    }
}

pub fn pointed_index(icons: &[Icon]) -> Option<usize> {
    icons.iter().position(|icon| icon.is_pointed)
}

/// Index the renderer starts from: right after the pointed icon, so that the
/// pointed icon is drawn last and overlaps its neighbours.
pub fn first_drawn_index(icons: &[Icon]) -> usize {
    match pointed_index(icons) {
        Some(index) if index + 1 < icons.len() => index + 1,
        _ => 0,
    }
}

/// What is being dragged over a dock and how close to an icon edge it must
/// be to count as a drop between two icons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTarget {
    pub group: IconGroup,
    pub margin: f64,
}

impl DragTarget {
    /// An icon being moved: it may only land between two icons.
    pub fn between_icons(group: IconGroup) -> Self {
        Self { group, margin: 0.25 }
    }

    /// Content that can also be dropped onto an icon.
    pub fn anywhere(group: IconGroup) -> Self {
        Self { group, margin: 0.5 }
    }
}

fn avoid_mouse(icon: &mut Icon, direction: f64, amplitude: f64) {
    icon.avoids_mouse = true;
    if amplitude != 0.0 {
        icon.x_draw += icon.width * icon.scale / 4.0 * direction;
    }
}

/// Pushes the icons around the cursor apart when a drop between them is
/// possible, and returns whether it is.
pub fn check_can_drop(icons: &mut [Icon], mouse_x: f64, target: Option<&DragTarget>, amplitude: f64) -> bool {
    let Some(target) = target else {
        return false;
    };
    if icons.is_empty() {
        return true;
    }

    let mut can_drop = false;
    let mut i = 0;
    while i < icons.len() {
        if !icons[i].is_pointed {
            icons[i].avoids_mouse = false;
            i += 1;
            continue;
        }

        let (left_edge, right_edge) = {
            let icon = &icons[i];
            let span = icon.width * icon.scale;
            (icon.x_draw + span * target.margin, icon.x_draw + span * (1.0 - target.margin))
        };

        if mouse_x < left_edge {
            let prev_matches = i > 0 && icons[i - 1].group() == target.group;
            if icons[i].group() == target.group || prev_matches {
                avoid_mouse(&mut icons[i], 1.0, amplitude);
                if i > 0 {
                    avoid_mouse(&mut icons[i - 1], -1.0, amplitude);
                }
                can_drop = true;
            }
        } else if mouse_x > right_edge {
            let next_matches = icons.get(i + 1).is_some_and(|next| next.group() == target.group);
            if icons[i].group() == target.group || next_matches {
                avoid_mouse(&mut icons[i], -1.0, amplitude);
                if let Some(next) = icons.get_mut(i + 1) {
                    avoid_mouse(next, 1.0, amplitude);
                }
                can_drop = true;
            }
            // the next icon was handled with this one
            i += 1;
        }
        i += 1;
    }
    can_drop
}

pub fn stop_marking(icons: &mut [Icon]) {
    for icon in icons.iter_mut() {
        icon.avoids_mouse = false;
    }
}
