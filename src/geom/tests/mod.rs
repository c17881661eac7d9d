mod test_tube_radius;
mod test_tube_tcoords;
