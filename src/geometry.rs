#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

pub const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

pub const X: vector::Vector = vector::Vector(1.0, 0.0, 0.0);
pub const Y: vector::Vector = vector::Vector(0.0, 1.0, 0.0);
pub const Z: vector::Vector = vector::Vector(0.0, 0.0, 1.0);
pub const O: point::Point = point::Point(0.0, 0.0, 0.0);

pub mod traits {
    /// Dot product between any two direction-like quantities.
    pub trait DotProduct<Rhs = Self> {
        fn dot(&self, other: &Rhs) -> f64;
    }
}

pub mod vector {
    use crate::constants::EPSILON;
    use crate::geometry::traits::DotProduct;
    use crate::geometry::Axis;
    use approx::AbsDiffEq;
    use std::{
        fmt::Display,
        ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub, SubAssign},
    };

    #[derive(PartialEq, Clone, Copy, Debug)]
    pub struct Vector(pub f64, pub f64, pub f64);

    impl Vector {
        pub const NULL: Vector = Vector(0.0, 0.0, 0.0);

        pub fn new(x: i32, y: i32, z: i32) -> Vector {
            Vector(x as f64, y as f64, z as f64)
        }
        pub fn x(&self) -> f64 {
            self.0
        }
        pub fn y(&self) -> f64 {
            self.1
        }
        pub fn z(&self) -> f64 {
            self.2
        }
        pub fn magnitude_squared(&self) -> f64 {
            self.dot(self)
        }
        pub fn magnitude(&self) -> f64 {
            self.magnitude_squared().sqrt()
        }
        pub fn normalized(&self) -> Vector {
            *self / self.magnitude()
        }
        pub fn cross(&self, other: &Vector) -> Vector {
            Vector(
                self.y() * other.z() - self.z() * other.y(),
                self.z() * other.x() - self.x() * other.z(),
                self.x() * other.y() - self.y() * other.x(),
            )
        }
        pub fn is_finite(&self) -> bool {
            self.0.is_finite() && self.1.is_finite() && self.2.is_finite()
        }
        /// Returns two unit vectors forming an orthonormal basis with this
        /// (assumed unit) vector.
        pub fn generate_tangents(&self) -> (Vector, Vector) {
            let helper = if self.0.abs() > 0.9 {
                Vector(0.0, 1.0, 0.0)
            } else {
                Vector(1.0, 0.0, 0.0)
            };
            let tangent = self.cross(&helper).normalized();
            let bitangent = self.cross(&tangent);
            (tangent, bitangent)
        }
    }

    impl DotProduct for Vector {
        fn dot(&self, other: &Vector) -> f64 {
            self.0 * other.0 + self.1 * other.1 + self.2 * other.2
        }
    }

    impl Add for Vector {
        type Output = Vector;
        fn add(self, rhs: Self) -> Self::Output {
            Vector(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
        }
    }

    impl AddAssign for Vector {
        fn add_assign(&mut self, rhs: Self) {
            self.0 += rhs.0;
            self.1 += rhs.1;
            self.2 += rhs.2;
        }
    }

    impl Sub for Vector {
        type Output = Vector;
        fn sub(self, rhs: Self) -> Self::Output {
            Vector(self.0 - rhs.0, self.1 - rhs.1, self.2 - rhs.2)
        }
    }

    impl SubAssign for Vector {
        fn sub_assign(&mut self, rhs: Self) {
            self.0 -= rhs.0;
            self.1 -= rhs.1;
            self.2 -= rhs.2;
        }
    }

    impl Mul<f64> for Vector {
        type Output = Vector;
        fn mul(self, rhs: f64) -> Self::Output {
            Vector(self.0 * rhs, self.1 * rhs, self.2 * rhs)
        }
    }

    impl MulAssign<f64> for Vector {
        fn mul_assign(&mut self, rhs: f64) {
            self.0 *= rhs;
            self.1 *= rhs;
            self.2 *= rhs;
        }
    }

    impl Div<f64> for Vector {
        type Output = Vector;
        fn div(self, rhs: f64) -> Self::Output {
            Vector(self.0 / rhs, self.1 / rhs, self.2 / rhs)
        }
    }

    impl DivAssign<f64> for Vector {
        fn div_assign(&mut self, rhs: f64) {
            self.0 /= rhs;
            self.1 /= rhs;
            self.2 /= rhs;
        }
    }

    impl Neg for Vector {
        type Output = Vector;
        fn neg(self) -> Self::Output {
            self * -1.0
        }
    }

    impl Index<Axis> for Vector {
        type Output = f64;
        fn index(&self, index: Axis) -> &Self::Output {
            match index {
                Axis::X => &self.0,
                Axis::Y => &self.1,
                Axis::Z => &self.2,
            }
        }
    }

    impl AbsDiffEq for Vector {
        type Epsilon = f64;

        fn default_epsilon() -> Self::Epsilon {
            EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
            self.0.abs_diff_eq(&other.0, epsilon)
                && self.1.abs_diff_eq(&other.1, epsilon)
                && self.2.abs_diff_eq(&other.2, epsilon)
        }
    }

    impl Display for Vector {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "({},{},{})", self.0, self.1, self.2)
        }
    }
}

pub mod point {
    use crate::constants::EPSILON;
    use crate::geometry::vector::Vector;
    use crate::geometry::Axis;
    use approx::AbsDiffEq;
    use std::{
        fmt::Display,
        ops::{Add, AddAssign, Index, Sub, SubAssign},
    };

    #[derive(PartialEq, Clone, Copy, Debug)]
    pub struct Point(pub f64, pub f64, pub f64);

    impl Point {
        pub const O: Point = Point(0.0, 0.0, 0.0);

        pub fn new(x: i32, y: i32, z: i32) -> Point {
            Point(x as f64, y as f64, z as f64)
        }
        pub fn x(&self) -> f64 {
            self.0
        }
        pub fn y(&self) -> f64 {
            self.1
        }
        pub fn z(&self) -> f64 {
            self.2
        }
        pub fn distance_squared(&self, other: &Point) -> f64 {
            (*other - *self).magnitude_squared()
        }
        pub fn min(&self, other: &Point) -> Point {
            Point(
                self.0.min(other.0),
                self.1.min(other.1),
                self.2.min(other.2),
            )
        }
        pub fn max(&self, other: &Point) -> Point {
            Point(
                self.0.max(other.0),
                self.1.max(other.1),
                self.2.max(other.2),
            )
        }
    }

    impl Sub<Point> for Point {
        type Output = Vector;
        fn sub(self, rhs: Point) -> Self::Output {
            Vector(self.0 - rhs.0, self.1 - rhs.1, self.2 - rhs.2)
        }
    }

    impl Add<Vector> for Point {
        type Output = Point;
        fn add(self, rhs: Vector) -> Self::Output {
            Point(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
        }
    }

    impl AddAssign<Vector> for Point {
        fn add_assign(&mut self, rhs: Vector) {
            self.0 += rhs.0;
            self.1 += rhs.1;
            self.2 += rhs.2;
        }
    }

    impl Sub<Vector> for Point {
        type Output = Point;
        fn sub(self, rhs: Vector) -> Self::Output {
            Point(self.0 - rhs.0, self.1 - rhs.1, self.2 - rhs.2)
        }
    }

    impl SubAssign<Vector> for Point {
        fn sub_assign(&mut self, rhs: Vector) {
            self.0 -= rhs.0;
            self.1 -= rhs.1;
            self.2 -= rhs.2;
        }
    }

    impl Index<Axis> for Point {
        type Output = f64;
        fn index(&self, index: Axis) -> &Self::Output {
            match index {
                Axis::X => &self.0,
                Axis::Y => &self.1,
                Axis::Z => &self.2,
            }
        }
    }

    impl AbsDiffEq for Point {
        type Epsilon = f64;

        fn default_epsilon() -> Self::Epsilon {
            EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
            self.0.abs_diff_eq(&other.0, epsilon)
                && self.1.abs_diff_eq(&other.1, epsilon)
                && self.2.abs_diff_eq(&other.2, epsilon)
        }
    }

    impl Display for Point {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "({},{},{})", self.0, self.1, self.2)
        }
    }
}

pub mod normal {
    use crate::constants::EPSILON;
    use crate::geometry::traits::DotProduct;
    use crate::geometry::vector::Vector;
    use crate::geometry::Axis;
    use approx::AbsDiffEq;
    use std::{
        fmt::Display,
        ops::{Index, IndexMut, Mul, Neg},
    };

    /// A surface normal. Kept distinct from Vector so orientation-sensitive
    /// operations (hemisphere tests, flipping against a ray) stay explicit.
    #[derive(PartialEq, Clone, Copy, Debug)]
    pub struct Normal(pub f64, pub f64, pub f64);

    impl Normal {
        pub fn x(&self) -> f64 {
            self.0
        }
        pub fn y(&self) -> f64 {
            self.1
        }
        pub fn z(&self) -> f64 {
            self.2
        }
        pub fn magnitude(&self) -> f64 {
            self.dot(self).sqrt()
        }
        pub fn normalized(&self) -> Normal {
            let mag = self.magnitude();
            Normal(self.0 / mag, self.1 / mag, self.2 / mag)
        }
        pub fn is_finite(&self) -> bool {
            self.0.is_finite() && self.1.is_finite() && self.2.is_finite()
        }
        /// Flips the normal into the hemisphere opposing `direction`.
        pub fn facing(&self, direction: &Vector) -> Normal {
            if self.dot(direction) > 0.0 {
                -*self
            } else {
                *self
            }
        }
        pub fn same_hemisphere(&self, a: &Vector, b: &Vector) -> bool {
            self.dot(a) * self.dot(b) > 0.0
        }
        pub fn generate_tangents(&self) -> (Vector, Vector) {
            Vector::from(self).generate_tangents()
        }
    }

    impl From<Vector> for Normal {
        fn from(v: Vector) -> Normal {
            Normal(v.0, v.1, v.2)
        }
    }

    impl From<Normal> for Vector {
        fn from(n: Normal) -> Vector {
            Vector(n.0, n.1, n.2)
        }
    }

    impl From<&Normal> for Vector {
        fn from(n: &Normal) -> Vector {
            Vector(n.0, n.1, n.2)
        }
    }

    impl DotProduct for Normal {
        fn dot(&self, other: &Normal) -> f64 {
            self.0 * other.0 + self.1 * other.1 + self.2 * other.2
        }
    }

    impl DotProduct<Vector> for Normal {
        fn dot(&self, other: &Vector) -> f64 {
            self.0 * other.0 + self.1 * other.1 + self.2 * other.2
        }
    }

    impl DotProduct<Normal> for Vector {
        fn dot(&self, other: &Normal) -> f64 {
            self.0 * other.0 + self.1 * other.1 + self.2 * other.2
        }
    }

    impl Mul<f64> for Normal {
        type Output = Vector;
        fn mul(self, rhs: f64) -> Self::Output {
            Vector(self.0 * rhs, self.1 * rhs, self.2 * rhs)
        }
    }

    impl Neg for Normal {
        type Output = Normal;
        fn neg(self) -> Self::Output {
            Normal(-self.0, -self.1, -self.2)
        }
    }

    impl Index<Axis> for Normal {
        type Output = f64;
        fn index(&self, index: Axis) -> &Self::Output {
            match index {
                Axis::X => &self.0,
                Axis::Y => &self.1,
                Axis::Z => &self.2,
            }
        }
    }

    impl IndexMut<Axis> for Normal {
        fn index_mut(&mut self, index: Axis) -> &mut Self::Output {
            match index {
                Axis::X => &mut self.0,
                Axis::Y => &mut self.1,
                Axis::Z => &mut self.2,
            }
        }
    }

    impl AbsDiffEq for Normal {
        type Epsilon = f64;

        fn default_epsilon() -> Self::Epsilon {
            EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
            self.0.abs_diff_eq(&other.0, epsilon)
                && self.1.abs_diff_eq(&other.1, epsilon)
                && self.2.abs_diff_eq(&other.2, epsilon)
        }
    }

    impl Display for Normal {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "({},{},{})", self.0, self.1, self.2)
        }
    }
}
