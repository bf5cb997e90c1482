fn main() {
    horde_director::game::run();
}
