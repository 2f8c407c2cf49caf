pub mod tile_projection;
