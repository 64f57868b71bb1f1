//! Phong and Lambert lighting for a single point light.
//!
//! Light intensity falls off with the squared distance. Colours are linear
//! RGB in `Vec3` and are not clamped.

use super::core::{Point3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: f64,
    pub shininess: f64,
}

impl Default for PhongMaterial {
    fn default() -> Self {
        let tint = Vec3::new(1.0, 0.5, 0.5);
        Self {
            ambient: tint.mul_scalar(0.3),
            diffuse: tint.mul_scalar(0.7),
            specular: 0.4,
            shininess: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3,
    pub intensity: f64,
    /// Linear RGB tint applied to the diffuse and specular terms.
    pub colour: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Point3::new(4.0, 1.0, 4.0),
            intensity: 20.0,
            colour: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

struct LightTerms {
    irradiance: f64,
    lambert: f64,
    to_light: Vec3,
    normal: Vec3,
}

fn light_terms(light: &PointLight, point: Point3, normal: Vec3) -> Option<LightTerms> {
    let normal = normal.normalized()?;
    let offset = light.position.sub_point(point);
    let dist2 = offset.length_squared();
    let to_light = offset.normalized()?;
    Some(LightTerms {
        irradiance: light.intensity / dist2,
        lambert: normal.dot(to_light).max(0.0),
        to_light,
        normal,
    })
}

/// `ka + kd · c · I/d² · max(n·l, 0)`, with `c` the light colour.
#[must_use]
pub fn shade_lambert(material: &PhongMaterial, light: &PointLight, point: Point3, normal: Vec3) -> Vec3 {
    let Some(terms) = light_terms(light, point, normal) else {
        return material.ambient;
    };
    material
        .ambient
        .add(material.diffuse.mul_elem(light.colour).mul_scalar(terms.irradiance * terms.lambert))
}

/// Lambert plus `ks · I/d² · max(v·r, 0)^n`, with `r` the reflected light.
#[must_use]
pub fn shade_phong(
    material: &PhongMaterial,
    light: &PointLight,
    point: Point3,
    normal: Vec3,
    eye: Point3,
) -> Vec3 {
    let Some(terms) = light_terms(light, point, normal) else {
        return material.ambient;
    };
    let diffuse = shade_lambert(material, light, point, normal);
    if terms.lambert <= 0.0 {
        return diffuse;
    }
    let Some(view) = eye.sub_point(point).normalized() else {
        return diffuse;
    };
    let reflected = terms.to_light.mul_scalar(-1.0).reflect(terms.normal);
    let highlight = view.dot(reflected).max(0.0).powf(material.shininess);
    let s = material.specular * terms.irradiance * highlight;
    diffuse.add(light.colour.mul_scalar(s))
}
