use clap::Parser;
use glam::Vec3A;
use log::{error, info};

use darkroom::cli::Args;
use darkroom::color::Color;
use darkroom::develop::{self, DevelopParams};
use darkroom::lens::Lens;
use darkroom::lights::Light;
use darkroom::logger::init_logger;
use darkroom::materials::Material;
use darkroom::shapes::{Plane, Sphere, Surface};
use darkroom::tracer::{self, RenderParams};

/// Aperture diameter of the scene's lens, in world units.
const LENS_RADIUS: f32 = 2.0;
/// F-number shared by capture and develop.
const F_NUMBER: f32 = 0.8;

/// Build the fixed room: white walls with one red and one blue accent,
/// two painted spheres, a mirror sphere, and the capturing lens.
fn create_scene() -> Vec<Surface> {
    let white = Material::Diffuse {
        color: Color::new(0.9, 0.9, 0.9),
    };
    let red = Material::Diffuse {
        color: Color::new(0.9, 0.3, 0.3),
    };
    let blue = Material::Diffuse {
        color: Color::new(0.3, 0.3, 0.9),
    };

    let camera_pos = Vec3A::new(-2.0, 4.0, 2.0);
    let camera_target = Vec3A::new(2.0, -4.0, -2.0);

    vec![
        // The room.
        Surface::Plane(Plane::new(Vec3A::new(0.0, 0.0, -6.0), Vec3A::Z, white)), // Floor
        Surface::Plane(Plane::new(Vec3A::new(0.0, 0.0, 6.0), -Vec3A::Z, white)), // Ceiling
        Surface::Plane(Plane::new(Vec3A::new(0.0, -6.0, 0.0), Vec3A::Y, white)), // North wall
        Surface::Plane(Plane::new(Vec3A::new(0.0, 6.0, 0.0), -Vec3A::Y, white)), // South wall
        Surface::Plane(Plane::new(Vec3A::new(-6.0, 0.0, 0.0), Vec3A::X, red)),   // West wall
        Surface::Plane(Plane::new(Vec3A::new(6.0, 0.0, 0.0), -Vec3A::X, blue)),  // East wall
        // The props.
        Surface::Sphere(Sphere::new(Vec3A::new(-4.0, -4.0, 1.0), 2.0, blue)),
        Surface::Sphere(Sphere::new(Vec3A::new(4.0, -4.0, 1.0), 2.0, red)),
        Surface::Sphere(Sphere::new(Vec3A::new(0.0, 0.0, -3.0), 3.0, Material::Mirror)),
        // The camera.
        Surface::Lens(Lens::new(
            camera_pos,
            camera_target - camera_pos,
            Vec3A::Z,
            LENS_RADIUS,
            F_NUMBER,
        )),
    ]
}

/// The fixed light rig: a white sphere light overhead and a green point
/// light tucked behind the mirror sphere.
fn create_lights() -> Vec<Light> {
    vec![
        Light::OmniSphere {
            position: Vec3A::new(0.0, 0.0, 5.0),
            radius: 1.0,
            intensity: 1.0,
            color: Color::ONE,
        },
        Light::PointLight {
            position: Vec3A::new(0.0, 5.0, -5.0),
            intensity: 1.0,
            color: Color::new(0.0, 1.0, 0.0),
        },
    ]
}

fn run(args: &Args) -> std::io::Result<()> {
    std::fs::create_dir_all(&args.output)?;
    let film_path = args.output.join("out.dat");

    if !args.develop_only {
        let scene = create_scene();
        let lights = create_lights();
        let params = RenderParams {
            passes: args.passes,
            multiplier: args.multiplier,
            bounces: args.bounces,
            threads: args.threads,
            seed: args.seed,
            lens_radius: LENS_RADIUS,
            ..RenderParams::default()
        };
        tracer::render(&scene, &lights, &params, &film_path)?;
    }

    if !args.render_only {
        let params = DevelopParams {
            width: args.width,
            height: args.height,
            frames: args.frames,
            f_number: F_NUMBER,
            ..DevelopParams::default()
        };
        develop::develop(&film_path, &args.output, &params)?;
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(args.debug_level.clone().into());

    info!("Darkroom - Git Version {} ({})", env!("GIT_HASH"), env!("GIT_DATE"));

    if let Err(error) = run(&args) {
        error!("Aborted: {error}");
        std::process::exit(1);
    }
}
