use std::hint::black_box;
use std::time::Instant;

use debugviz_geometry::{Mesh, build_normal_segments, build_plane, build_thick_line_grid};

fn bench_thick_line_grid(segments: u32, iterations: usize) {
    let start = Instant::now();
    for _ in 0..iterations {
        let grid = build_thick_line_grid(
            black_box(1000.0),
            black_box(1000.0),
            segments,
            segments,
            0.4,
        )
        .unwrap();
        black_box(grid);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  thick_line_grid ({segments}x{segments}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_plane(segments: u32, iterations: usize) {
    let start = Instant::now();
    for _ in 0..iterations {
        black_box(build_plane(black_box(1000.0), 1000.0, segments, segments).unwrap());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  plane ({segments}x{segments}, {iterations} iters): {per_iter:?}/iter");
}

fn bench_normal_segments(box_segments: u32, iterations: usize) {
    let mesh = Mesh::box_mesh(200.0, 200.0, 200.0, [box_segments; 3]).unwrap();
    let start = Instant::now();
    for _ in 0..iterations {
        black_box(build_normal_segments(black_box(&mesh.positions), &mesh.normals, 20.0).unwrap());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  normal_segments ({} vertices, {iterations} iters): {per_iter:?}/iter",
        mesh.vertex_count()
    );
}

fn main() {
    println!("=== Geometry builder benchmarks ===");
    println!();

    println!("Thick line grid:");
    bench_thick_line_grid(50, 10_000);
    bench_thick_line_grid(500, 1_000);
    bench_thick_line_grid(5_000, 100);
    println!();

    println!("Plane:");
    bench_plane(10, 10_000);
    bench_plane(100, 1_000);
    println!();

    println!("Normal segments:");
    bench_normal_segments(1, 10_000);
    bench_normal_segments(16, 1_000);
    bench_normal_segments(40, 100);
}
