//! Physical and mathematical constant table for the `\` opcode.

/// Look up a constant by its letter; unmapped letters yield NaN.
pub fn constant(letter: char) -> f64 {
    match letter {
        'C' => 299_792_458.0,        // speed of light
        'E' => std::f64::consts::E,  // Euler's number
        'F' => 96_485.332_123_31,    // Faraday constant
        'G' => 6.674_301_5e-11,      // gravitational constant
        'K' => 1.380_649e-23,        // Boltzmann constant
        'L' => 6.022_140_76e23,      // Avogadro constant
        'P' => std::f64::consts::PI,
        'R' => 8.314_462_618_153_2,  // gas constant
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_letters() {
        assert_eq!(constant('P'), std::f64::consts::PI);
        assert_eq!(constant('C'), 299_792_458.0);
    }

    #[test]
    fn unmapped_letters_are_nan() {
        assert!(constant('Z').is_nan());
        assert!(constant('x').is_nan());
    }
}
