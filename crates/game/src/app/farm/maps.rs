use std::rc::Rc;

use farmstead_engine::{Cell, Drawable, Map, ScheduleError, Scheduler, TimerHandle};
use tracing::{debug, warn};

use super::data::MapLayout;
use super::error::FarmError;
use super::tiles::{FarmTiles, LOOPING};

/// Frames per second of looping tile animations.
const LOOP_RATE: f64 = 2.0;

/// Paints a layout into a fresh [`Map`]. Fills apply in order, so later
/// fills overwrite earlier ones on the same layer.
pub(crate) fn build_map(layout: &MapLayout, tiles: &FarmTiles) -> Result<Map, FarmError> {
    let names: Vec<&str> = layout.layers.iter().map(String::as_str).collect();
    let mut map = Map::new(layout.key.as_str(), layout.size, tiles.cell_size(), &names)?;

    for fill in &layout.fills {
        let layer = map
            .layer(&fill.layer)
            .ok_or_else(|| FarmError::UnknownLayer {
                map: layout.key.clone(),
                layer: fill.layer.clone(),
            })?;
        let drawable = tiles
            .drawable(&fill.tile)
            .ok_or_else(|| FarmError::UnknownTile {
                map: layout.key.clone(),
                tile: fill.tile.clone(),
            })?;

        let mut layer = layer.borrow_mut();
        let outside = fill
            .rect
            .points()
            .filter(|&point| !layer.update_cell(point, drawable.clone()))
            .count();
        if outside > 0 {
            warn!(
                map = %layout.key,
                layer = %fill.layer,
                tile = %fill.tile,
                outside,
                "map_fill_outside_grid"
            );
        }
    }

    for rect in &layout.invisible_blocks {
        for point in rect.points() {
            map.add_invisible_block(point);
        }
    }

    for door in &layout.doors {
        if map.layer(&door.layer).is_none() {
            return Err(FarmError::UnknownLayer {
                map: layout.key.clone(),
                layer: door.layer.clone(),
            });
        }
    }

    debug!(map = %layout.key, fills = layout.fills.len(), "map_built");
    Ok(map)
}

/// Starts one repeating timer per layer that steps every `LOOPING`
/// animation on it in lockstep.
pub(crate) fn animate_looping(
    map: &Map,
    tiles: &FarmTiles,
    scheduler: &Scheduler,
) -> Result<Vec<TimerHandle>, ScheduleError> {
    let mut timers = Vec::new();
    for (name, layer) in map.layers() {
        let (cells, frames) = {
            let grid = layer.borrow();
            let loops = |content: &Drawable| tiles.has_tag(content, LOOPING);
            let looping: Vec<&Cell> = grid
                .cells()
                .filter(|cell| cell.content().is_some_and(loops))
                .collect();
            let frames = looping
                .iter()
                .filter_map(|cell| cell.content())
                .map(Drawable::frame_count)
                .max()
                .unwrap_or(0);
            let cells: Vec<_> = looping.iter().map(|cell| cell.coordinate()).collect();
            (cells, frames)
        };
        if cells.is_empty() || frames < 2 {
            continue;
        }

        let animated = cells.len();
        let layer = Rc::clone(layer);
        let timer = scheduler.register(LOOP_RATE, frames as u32, move |count| {
            let Ok(mut grid) = layer.try_borrow_mut() else {
                return;
            };
            for &coordinate in &cells {
                let next = grid
                    .get_cell(coordinate)
                    .and_then(Cell::content)
                    .filter(|content| matches!(content, Drawable::Animated { .. }))
                    .map(|content| content.with_frame(count as usize));
                if let Some(next) = next {
                    grid.update_cell(coordinate, next);
                }
            }
        })?;
        debug!(
            map = map.key(),
            layer = name,
            cells = animated,
            frames,
            "map_animation_started"
        );
        timers.push(timer);
    }
    Ok(timers)
}
