//! Numeric constants shared across the render core. Reproduced exactly as
//! specified — these are not tuning knobs, they are part of the renderer's
//! documented contract (spec design notes §9: "Numeric vocabulary").

/// Octree recursion depth ceiling; a subcell forced to this level is
/// always a leaf regardless of item count.
pub const MAX_LEVELS: u32 = 44;

/// A spatial-index leaf holds at most this many triangles before becoming
/// a candidate for subdivision into a branch.
pub const MAX_ITEMS: usize = 8;

/// Bound-expansion tolerance applied to triangle and octree-cell bounds,
/// and the threshold below which a subcell's side length forces terminal
/// (leaf-only) recursion.
pub const TRIANGLE_TOLERANCE: f64 = 1.0 / 1024.0; // 2^-10

/// Möller–Trumbore determinant threshold below which a ray is treated as
/// parallel to the triangle's plane.
pub const TRIANGLE_EPSILON: f64 = 1.0 / 1_048_576.0; // 2^-20

/// Ward tone-mapping display luminance maximum.
pub const DISPLAY_LUMINANCE_MAX: f64 = 200.0;

/// Gamma-encoding exponent applied after tone mapping.
pub const GAMMA_ENCODE: f64 = 0.45;

/// Maximum permitted image width/height.
pub const IMAGE_DIM_MAX: u32 = 4000;

/// Maximum number of triangles a scene may hold.
pub const MAX_TRIANGLES: usize = 1 << 24;

/// Rec. 709 relative luminance weights, used both by Ward tone mapping and
/// the Image's adaptation-luminance estimate.
pub const LUMINANCE_WEIGHTS: (f64, f64, f64) = (0.2126, 0.7152, 0.0722);
