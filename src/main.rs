fn main() {
    volley::game::run();
}
