use crate::*;

/// The built-in 10x10 rink. One target in the middle, two holes, one
/// portal pair on the center column, spawns in the top corners.
pub const CLASSIC: &str = "
    P1 E  E  E  W  E  E  E  E  P2
    E  W  E  O1 E  E  E  W  E  E
    E  E  E  W  E  W  E  E  W  E
    E  E  W  E  E  E  W  E  H  E
    W  E  E  E  T  E  E  E  E  W
    W  E  E  H  E  E  E  E  E  W
    E  E  E  W  E  E  W  E  E  E
    E  E  W  E  E  W  E  W  E  E
    E  W  E  O1 E  E  E  E  W  E
    E  E  E  E  W  E  E  E  E  E
";

/// The board every new game starts on.
pub fn classic() -> Board {
    super::parse(CLASSIC).expect("built-in layout should parse")
}
